//! Column metadata.
//!
//! A [`ModelMeta`] describes one persisted entity: its table or collection,
//! its primary key and its columns. Backends can introspect it or the
//! application can declare it by hand; resources scaffold their fields from it.

use adminkit_widgets::options::{EnumChoices, EnumKind};
use serde_json::Value;

/// The native type of a column, used as the converter lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// `BOOLEAN`.
    Boolean,
    /// A timestamp.
    DateTime,
    /// A calendar date.
    Date,
    /// A bounded string (`VARCHAR`).
    String,
    /// Unbounded text.
    Text,
    /// An integer.
    Integer,
    /// A floating point or decimal number.
    Float,
    /// A JSON document.
    Json,
    /// An integer-backed enumeration.
    IntEnum,
    /// A string-backed enumeration.
    StrEnum,
    /// A reference to one row of another model.
    ForeignKey,
    /// A set of rows of another model, stored in a link table.
    ManyToMany,
    /// The reverse side of a relation declared on another model.
    BackwardRelation,
    /// Anything else.
    Other,
}

impl ColumnKind {
    /// Returns `true` for relations declared on another model.
    pub const fn is_backward(self) -> bool {
        matches!(self, Self::BackwardRelation)
    }
}

/// The link table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Through {
    /// The link table.
    pub table: String,
    /// The column referencing the owning row.
    pub source_column: String,
    /// The column referencing the related row.
    pub target_column: String,
}

/// Where a relation column points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// The related table or collection.
    pub target: String,
    /// The primary key of the related model.
    pub target_pk: String,
    /// The related column shown as the option label.
    pub label_column: String,
    /// The physical column holding the key (foreign keys only).
    pub source_column: Option<String>,
    /// The link table (many-to-many only).
    pub through: Option<Through>,
}

impl Relation {
    /// A relation to `target`, labelled by its primary key `id`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            target_pk: "id".to_string(),
            label_column: "id".to_string(),
            source_column: None,
            through: None,
        }
    }

    /// Sets the primary key of the related model.
    #[must_use]
    pub fn target_pk(mut self, pk: impl Into<String>) -> Self {
        let pk = pk.into();
        if self.label_column == self.target_pk {
            self.label_column.clone_from(&pk);
        }
        self.target_pk = pk;
        self
    }

    /// Labels options with `column` of the related model.
    #[must_use]
    pub fn label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = column.into();
        self
    }
}

/// One column of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMeta {
    /// The attribute name.
    pub name: String,
    /// The native type.
    pub kind: ColumnKind,
    /// Whether null is allowed.
    pub nullable: bool,
    /// Whether this column is the primary key.
    pub primary_key: bool,
    /// A client-side default.
    pub default: Option<Value>,
    /// Whether the database fills the value (server default, auto-now, autoincrement).
    pub server_default: bool,
    /// Free-text description, used as placeholder.
    pub description: Option<String>,
    /// Members of an enum column.
    pub choices: Option<EnumChoices>,
    /// Target of a relation column.
    pub relation: Option<Relation>,
}

impl ColumnMeta {
    /// A non-null column with no default.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            primary_key: false,
            default: None,
            server_default: false,
            description: None,
            choices: None,
            relation: None,
        }
    }

    /// An integer primary key filled by the database.
    pub fn primary_key(name: impl Into<String>) -> Self {
        let mut column = Self::new(name, ColumnKind::Integer);
        column.primary_key = true;
        column.server_default = true;
        column
    }

    /// An enum column over `choices`.
    pub fn enumeration(name: impl Into<String>, choices: EnumChoices) -> Self {
        let kind = match choices.kind() {
            EnumKind::Int => ColumnKind::IntEnum,
            EnumKind::Str => ColumnKind::StrEnum,
        };
        let mut column = Self::new(name, kind);
        column.choices = Some(choices);
        column
    }

    /// A foreign key stored in `source_column`.
    ///
    /// `name` is the relation attribute; forms and rows use `source_column`.
    pub fn foreign_key(
        name: impl Into<String>,
        source_column: impl Into<String>,
        relation: Relation,
    ) -> Self {
        let mut column = Self::new(name, ColumnKind::ForeignKey);
        column.relation = Some(Relation {
            source_column: Some(source_column.into()),
            ..relation
        });
        column
    }

    /// A many-to-many relation stored in `through`.
    pub fn many_to_many(name: impl Into<String>, relation: Relation, through: Through) -> Self {
        let mut column = Self::new(name, ColumnKind::ManyToMany);
        column.nullable = true;
        column.relation = Some(Relation {
            through: Some(through),
            ..relation
        });
        column
    }

    /// Allows null.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets a client-side default.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Marks the value as filled by the database.
    #[must_use]
    pub const fn server_default(mut self) -> Self {
        self.server_default = true;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The column that holds the value in rows and forms.
    pub fn storage_name(&self) -> &str {
        self.relation
            .as_ref()
            .and_then(|r| r.source_column.as_deref())
            .unwrap_or(&self.name)
    }
}

/// A persisted entity.
///
/// ```
/// use adminkit_admin::column::{ColumnKind, ColumnMeta, ModelMeta};
///
/// let meta = ModelMeta::new("user")
///     .column(ColumnMeta::primary_key("id"))
///     .column(ColumnMeta::new("username", ColumnKind::String));
/// assert_eq!(meta.pk(), "id");
/// assert!(meta.get("username").is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMeta {
    name: String,
    columns: Vec<ColumnMeta>,
}

impl ModelMeta {
    /// A model stored in table or collection `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column.
    #[must_use]
    pub fn column(mut self, column: ColumnMeta) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds or replaces a column by name.
    pub fn upsert_column(&mut self, column: ColumnMeta) {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    /// The table or collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All columns in declaration order.
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    /// Looks up a column by attribute name, or by storage name for foreign keys.
    pub fn get(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.storage_name() == name))
    }

    /// The primary key column.
    pub fn pk_column(&self) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// The primary key name, `id` when none is marked.
    pub fn pk(&self) -> &str {
        self.pk_column().map_or("id", |c| c.name.as_str())
    }

    /// Many-to-many columns.
    pub fn many_to_many(&self) -> impl Iterator<Item = &ColumnMeta> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::ManyToMany)
    }
}
