//! Column-to-field conversion.
//!
//! A [`ConverterRegistry`] maps a [`ColumnKind`] to the converter that picks
//! the display and input for columns of that kind. Kinds without a converter
//! go to the fallback. Dialects start from [`ConverterRegistry::standard`] and
//! register their own variations on top.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use adminkit_widgets::displays::{self, Display};
use adminkit_widgets::inputs::{self, Input};
use adminkit_widgets::widget::title_case;

use crate::backend::OrmBackend;
use crate::column::{ColumnKind, ColumnMeta};
use crate::field::Field;

/// The display and input chosen for a column.
pub struct FieldSpec {
    /// The list display.
    pub display: Box<dyn Display>,
    /// The form input.
    pub input: Box<dyn Input>,
    /// Overrides the field name, for columns stored under another name.
    pub field_name: Option<String>,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("display", &self.display.display_type())
            .field("input", &self.input.input_type())
            .field("field_name", &self.field_name)
            .finish()
    }
}

impl FieldSpec {
    /// A spec without a name override.
    pub fn new(display: impl Display + 'static, input: impl Input + 'static) -> Self {
        Self {
            display: Box::new(display),
            input: Box::new(input),
            field_name: None,
        }
    }

    /// Stores the field under `name`.
    #[must_use]
    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = Some(name.into());
        self
    }
}

/// Picks the widgets for one kind of column.
pub trait ColumnConverter: Send + Sync {
    /// Converts `column`. `backend` supplies related-row options.
    fn convert(&self, column: &ColumnMeta, backend: &dyn OrmBackend) -> FieldSpec;
}

impl<F> ColumnConverter for F
where
    F: Fn(&ColumnMeta, &dyn OrmBackend) -> FieldSpec + Send + Sync,
{
    fn convert(&self, column: &ColumnMeta, backend: &dyn OrmBackend) -> FieldSpec {
        self(column, backend)
    }
}

/// Converter lookup by column kind.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<ColumnKind, Arc<dyn ColumnConverter>>,
    fallback: Arc<dyn ColumnConverter>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self.converters.keys().map(|k| format!("{k:?}")).collect();
        kinds.sort();
        f.debug_struct("ConverterRegistry")
            .field("kinds", &kinds)
            .finish_non_exhaustive()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ConverterRegistry {
    /// An empty registry that sends every kind to `fallback`.
    pub fn new(fallback: impl ColumnConverter + 'static) -> Self {
        Self {
            converters: HashMap::new(),
            fallback: Arc::new(fallback),
        }
    }

    /// The converters shared by the bundled dialects.
    pub fn standard() -> Self {
        let mut registry = Self::new(convert_fallback);
        registry.register(ColumnKind::Boolean, convert_boolean);
        registry.register(ColumnKind::DateTime, convert_datetime);
        registry.register(ColumnKind::Date, convert_date);
        registry.register(ColumnKind::String, convert_text_area);
        registry.register(ColumnKind::Text, convert_text_area);
        registry.register(ColumnKind::Integer, convert_number);
        registry.register(ColumnKind::Float, convert_number);
        registry.register(ColumnKind::Json, convert_json);
        registry.register(ColumnKind::IntEnum, convert_enum);
        registry.register(ColumnKind::StrEnum, convert_enum);
        registry.register(ColumnKind::ForeignKey, convert_foreign_key);
        registry.register(ColumnKind::ManyToMany, convert_many_to_many);
        registry
    }

    /// Registers or replaces the converter for `kind`.
    pub fn register(&mut self, kind: ColumnKind, converter: impl ColumnConverter + 'static) {
        self.converters.insert(kind, Arc::new(converter));
    }

    /// Returns `true` if `kind` has its own converter.
    pub fn contains(&self, kind: ColumnKind) -> bool {
        self.converters.contains_key(&kind)
    }

    /// The converter for `kind`, or the fallback.
    pub fn get(&self, kind: ColumnKind) -> &dyn ColumnConverter {
        self.converters
            .get(&kind)
            .map_or(self.fallback.as_ref(), |converter| converter.as_ref())
    }

    /// Builds the field for `column`.
    ///
    /// Nullability and defaults are copied to the input. Primary keys and
    /// database-filled columns always get a display-only input.
    pub fn convert(&self, column: &ColumnMeta, backend: &dyn OrmBackend) -> Field {
        let spec = self.get(column.kind).convert(column, backend);
        let mut input = spec.input;
        if column.primary_key || column.server_default {
            input = Box::new(inputs::DisplayOnly::new());
        }
        input.set_null(column.nullable);
        if let Some(default) = &column.default {
            input.set_default(default.clone());
        }
        let name = spec.field_name.unwrap_or_else(|| column.name.clone());
        Field::new(name)
            .label(title_case(&column.name))
            .boxed_display(spec.display)
            .boxed_input(input)
    }
}

fn placeholder(column: &ColumnMeta) -> &str {
    column.description.as_deref().unwrap_or_default()
}

/// Raw display and a text input.
pub fn convert_fallback(column: &ColumnMeta, _backend: &dyn OrmBackend) -> FieldSpec {
    FieldSpec::new(
        displays::Raw::new(),
        inputs::Text::new().placeholder(placeholder(column)),
    )
}

/// Boolean display and a switch.
pub fn convert_boolean(_column: &ColumnMeta, _backend: &dyn OrmBackend) -> FieldSpec {
    FieldSpec::new(displays::Boolean::new(), inputs::Switch::new())
}

/// Datetime display and picker. Columns with a default cannot be edited.
pub fn convert_datetime(column: &ColumnMeta, _backend: &dyn OrmBackend) -> FieldSpec {
    if column.default.is_some() || column.server_default {
        return FieldSpec::new(displays::DatetimeDisplay::default(), inputs::DisplayOnly::new());
    }
    FieldSpec::new(displays::DatetimeDisplay::default(), inputs::DateTime::new())
}

/// Date display and a date picker.
pub fn convert_date(_column: &ColumnMeta, _backend: &dyn OrmBackend) -> FieldSpec {
    FieldSpec::new(displays::DateDisplay::default(), inputs::DateTime::date())
}

/// Raw display and a textarea.
pub fn convert_text_area(column: &ColumnMeta, _backend: &dyn OrmBackend) -> FieldSpec {
    FieldSpec::new(
        displays::Raw::new(),
        inputs::TextArea::new().placeholder(placeholder(column)),
    )
}

/// Raw display and a single-line text input.
pub fn convert_text(column: &ColumnMeta, _backend: &dyn OrmBackend) -> FieldSpec {
    FieldSpec::new(
        displays::Raw::new(),
        inputs::Text::new().placeholder(placeholder(column)),
    )
}

/// Raw display and a number input.
pub fn convert_number(_column: &ColumnMeta, _backend: &dyn OrmBackend) -> FieldSpec {
    FieldSpec::new(displays::Raw::new(), inputs::Number::new())
}

/// JSON display and editor.
pub fn convert_json(_column: &ColumnMeta, _backend: &dyn OrmBackend) -> FieldSpec {
    FieldSpec::new(displays::Json::new(), inputs::Json::new())
}

/// Member-name display and an enum select.
pub fn convert_enum(column: &ColumnMeta, backend: &dyn OrmBackend) -> FieldSpec {
    match &column.choices {
        Some(choices) => FieldSpec::new(
            displays::EnumDisplay::new(choices.clone()),
            inputs::Enum::new(choices.clone()),
        ),
        None => convert_fallback(column, backend),
    }
}

/// A select over the related rows, stored under the key column.
pub fn convert_foreign_key(column: &ColumnMeta, backend: &dyn OrmBackend) -> FieldSpec {
    let Some(relation) = &column.relation else {
        return convert_fallback(column, backend);
    };
    let spec = FieldSpec::new(
        displays::Raw::new(),
        inputs::Select::foreign_key(backend.relation_options(relation)),
    );
    match &relation.source_column {
        Some(source) => spec.field_name(source.clone()),
        None => spec,
    }
}

/// A multi-select over the related rows.
pub fn convert_many_to_many(column: &ColumnMeta, backend: &dyn OrmBackend) -> FieldSpec {
    let Some(relation) = &column.relation else {
        return convert_fallback(column, backend);
    };
    FieldSpec::new(
        displays::InputOnly::new(),
        inputs::ManyToMany::new(backend.relation_options(relation)),
    )
}

#[cfg(test)]
mod tests {
    use adminkit_widgets::displays::DisplayType;
    use adminkit_widgets::InputType;
    use serde_json::json;

    use super::*;
    use crate::column::Relation;
    use crate::testing::StubBackend;

    #[test]
    fn test_unknown_kind_falls_back_to_text() {
        let backend = StubBackend::default();
        let column = ColumnMeta::new("blob", ColumnKind::Other);
        let field = backend.converters().convert(&column, &backend);
        assert_eq!(field.input_widget().input_type(), InputType::Text);
        assert_eq!(field.display_widget().display_type(), DisplayType::Raw);
        assert!(!backend.converters().contains(ColumnKind::Other));
    }

    #[test]
    fn test_register_replaces_converter() {
        let backend = StubBackend::default();
        let mut registry = ConverterRegistry::standard();
        registry.register(ColumnKind::String, convert_text);
        let column = ColumnMeta::new("name", ColumnKind::String);
        let field = registry.convert(&column, &backend);
        assert_eq!(field.input_widget().input_type(), InputType::Text);
    }

    #[test]
    fn test_server_default_forces_display_only() {
        let backend = StubBackend::default();
        let column = ColumnMeta::new("counter", ColumnKind::Integer).server_default();
        let field = backend.converters().convert(&column, &backend);
        assert_eq!(field.input_widget().input_type(), InputType::DisplayOnly);
    }

    #[test]
    fn test_nullable_and_default_are_copied() {
        let backend = StubBackend::default();
        let column = ColumnMeta::new("score", ColumnKind::Integer)
            .nullable()
            .default_value(json!(5));
        let field = backend.converters().convert(&column, &backend);
        assert!(field.input_widget().is_nullable());
        assert_eq!(field.input_widget().default_value(), &json!(5));
    }

    #[test]
    fn test_foreign_key_uses_source_column() {
        let backend = StubBackend::default();
        let column = ColumnMeta::foreign_key("author", "author_id", Relation::new("user"));
        let field = backend.converters().convert(&column, &backend);
        assert_eq!(field.name(), "author_id");
        assert_eq!(field.label_text(), "Author");
        assert_eq!(field.input_widget().input_type(), InputType::ForeignKey);
    }
}
