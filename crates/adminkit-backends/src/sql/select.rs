//! The list query of the SQL dialect.

use std::collections::HashMap;

use adminkit_admin::column::ModelMeta;
use adminkit_admin::Pagination;
use adminkit_widgets::{Condition, FilterClause, FilterableQuery, TextMatch};
use rusqlite::types::Value as SqlValue;

use super::value::{quote, to_sql};

/// A `SELECT` over one table, narrowed by filter clauses.
///
/// Every condition is bound through placeholders; identifiers are quoted.
///
/// ```
/// use adminkit_admin::column::{ColumnKind, ColumnMeta, ModelMeta};
/// use adminkit_backends::sql::SqlSelect;
/// use adminkit_widgets::{Condition, FilterClause, FilterableQuery, TextMatch};
///
/// let meta = ModelMeta::new("user")
///     .column(ColumnMeta::primary_key("id"))
///     .column(ColumnMeta::new("username", ColumnKind::String));
/// let select = SqlSelect::new(&meta).apply_clause(&FilterClause::new(
///     "username",
///     Condition::Text { mode: TextMatch::IContains, term: "adm".into() },
/// ));
/// assert_eq!(
///     select.where_sql(),
///     " WHERE \"username\" LIKE ? ESCAPE '\\'"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SqlSelect {
    table: String,
    pk: String,
    storage: HashMap<String, String>,
    conditions: Vec<String>,
    params: Vec<SqlValue>,
}

impl SqlSelect {
    /// A query over every row of `meta`'s table.
    pub fn new(meta: &ModelMeta) -> Self {
        Self {
            table: meta.name().to_string(),
            pk: meta.pk().to_string(),
            storage: meta
                .columns()
                .iter()
                .map(|c| (c.name.clone(), c.storage_name().to_string()))
                .collect(),
            conditions: Vec::new(),
            params: Vec::new(),
        }
    }

    /// The `WHERE` conditions, joined with `AND` when rendered.
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    /// The bound values, in placeholder order.
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// The `WHERE` part, empty without conditions.
    pub fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Counts the matching rows.
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}{}", quote(&self.table), self.where_sql())
    }

    /// Selects one page of the matching rows, ordered by primary key.
    pub fn page_sql(&self, page: Pagination) -> String {
        format!(
            "SELECT * FROM {}{} ORDER BY {} LIMIT {} OFFSET {}",
            quote(&self.table),
            self.where_sql(),
            quote(&self.pk),
            page.page_size,
            page.offset()
        )
    }

    fn column(&self, field: &str) -> String {
        quote(self.storage.get(field).map_or(field, String::as_str))
    }

    fn push(&mut self, condition: String, params: impl IntoIterator<Item = SqlValue>) {
        self.conditions.push(condition);
        self.params.extend(params);
    }
}

/// A `GLOB` pattern for a case-sensitive match of `term`.
fn glob_pattern(mode: TextMatch, term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '*' | '?' | '[' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    match mode {
        TextMatch::StartsWith | TextMatch::IStartsWith => format!("{escaped}*"),
        TextMatch::EndsWith | TextMatch::IEndsWith => format!("*{escaped}"),
        TextMatch::Contains | TextMatch::IContains => format!("*{escaped}*"),
        TextMatch::Exact | TextMatch::IExact => escaped,
    }
}

impl FilterableQuery for SqlSelect {
    fn apply_clause(mut self, clause: &FilterClause) -> Self {
        let column = self.column(&clause.field);
        match &clause.condition {
            Condition::Text {
                mode: TextMatch::Exact,
                term,
            } => self.push(format!("{column} = ?"), [SqlValue::Text(term.clone())]),
            Condition::Text { mode, term } if mode.is_case_insensitive() => self.push(
                format!("{column} LIKE ? ESCAPE '\\'"),
                [SqlValue::Text(mode.like_pattern(term))],
            ),
            Condition::Text { mode, term } => self.push(
                format!("{column} GLOB ?"),
                [SqlValue::Text(glob_pattern(*mode, term))],
            ),
            Condition::Equal(value) => self.push(format!("{column} = ?"), [to_sql(value)]),
            Condition::Between(low, high) => self.push(
                format!("{column} BETWEEN ? AND ?"),
                [to_sql(low), to_sql(high)],
            ),
        }
        self
    }
}
