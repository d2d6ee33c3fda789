//! Lookups over JSON documents.
//!
//! A [`DocumentQuery`] is a chain of `field__op` lookups such as
//! `title__icontains` or `id__in`. All lookups must match.

use std::cmp::Ordering;

use adminkit_admin::Row;
use adminkit_widgets::widget::value_to_string;
use adminkit_widgets::{Condition, FilterClause, FilterableQuery, TextMatch};
use serde_json::Value;

/// A comparison applied by a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOp {
    /// `field` or `field__exact`.
    Exact,
    /// A text comparison.
    Text(TextMatch),
    /// `field__gt`.
    Gt,
    /// `field__gte`.
    Gte,
    /// `field__lt`.
    Lt,
    /// `field__lte`.
    Lte,
    /// `field__in`, against an array.
    In,
}

impl LookupOp {
    fn parse(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "exact" => Self::Exact,
            "iexact" => Self::Text(TextMatch::IExact),
            "contains" => Self::Text(TextMatch::Contains),
            "icontains" => Self::Text(TextMatch::IContains),
            "startswith" => Self::Text(TextMatch::StartsWith),
            "istartswith" => Self::Text(TextMatch::IStartsWith),
            "endswith" => Self::Text(TextMatch::EndsWith),
            "iendswith" => Self::Text(TextMatch::IEndsWith),
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "in" => Self::In,
            _ => return None,
        })
    }

    const fn suffix(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Text(TextMatch::Exact) => "exact",
            Self::Text(TextMatch::IExact) => "iexact",
            Self::Text(TextMatch::Contains) => "contains",
            Self::Text(TextMatch::IContains) => "icontains",
            Self::Text(TextMatch::StartsWith) => "startswith",
            Self::Text(TextMatch::IStartsWith) => "istartswith",
            Self::Text(TextMatch::EndsWith) => "endswith",
            Self::Text(TextMatch::IEndsWith) => "iendswith",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
        }
    }
}

/// One `field__op = value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// The document field.
    pub field: String,
    /// The comparison.
    pub op: LookupOp,
    /// The operand.
    pub value: Value,
}

impl Lookup {
    /// Parses `field__op`. A key without a known suffix is an exact lookup
    /// on the whole key.
    pub fn new(key: &str, value: Value) -> Self {
        let (field, op) = key
            .rsplit_once("__")
            .and_then(|(field, suffix)| LookupOp::parse(suffix).map(|op| (field, op)))
            .unwrap_or((key, LookupOp::Exact));
        Self {
            field: field.to_string(),
            op,
            value,
        }
    }

    /// The `field__op` key.
    pub fn key(&self) -> String {
        format!("{}__{}", self.field, self.op.suffix())
    }

    /// Tests one document.
    pub fn matches(&self, document: &Row) -> bool {
        let actual = document.get(&self.field).unwrap_or(&Value::Null);
        match self.op {
            LookupOp::Exact => loosely_equal(actual, &self.value),
            LookupOp::Text(mode) => {
                !actual.is_null()
                    && mode.matches(&value_to_string(actual), &value_to_string(&self.value))
            }
            LookupOp::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            LookupOp::Gte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            LookupOp::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            LookupOp::Lte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            LookupOp::In => self
                .value
                .as_array()
                .is_some_and(|items| items.iter().any(|item| loosely_equal(actual, item))),
        }
    }
}

/// Equality that lets `"1"` match `1` and `true` match `"true"`, the way
/// form and query-string values arrive.
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    actual == expected
        || (!actual.is_null()
            && !expected.is_null()
            && !actual.is_object()
            && !actual.is_array()
            && value_to_string(actual) == value_to_string(expected))
}

/// Orders numbers numerically and strings lexically. Other pairs are unordered.
fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&b.parse::<f64>().ok()?),
        (Value::String(a), Value::Number(b)) => a.parse::<f64>().ok()?.partial_cmp(&b.as_f64()?),
        _ => None,
    }
}

/// A query over one collection.
///
/// ```
/// use adminkit_backends::document::DocumentQuery;
/// use serde_json::json;
///
/// let query = DocumentQuery::new("user")
///     .filter("username__istartswith", json!("ad"))
///     .filter("age__gte", json!(18));
/// let row = json!({"username": "Admin", "age": 30});
/// assert!(query.matches(row.as_object().unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    collection: String,
    lookups: Vec<Lookup>,
}

impl DocumentQuery {
    /// Every document of `collection`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            lookups: Vec::new(),
        }
    }

    /// Adds a `field__op` lookup.
    #[must_use]
    pub fn filter(mut self, key: &str, value: Value) -> Self {
        self.lookups.push(Lookup::new(key, value));
        self
    }

    /// The collection queried.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The lookups, in the order added.
    pub fn lookups(&self) -> &[Lookup] {
        &self.lookups
    }

    /// Returns `true` if `document` satisfies every lookup.
    pub fn matches(&self, document: &Row) -> bool {
        self.lookups.iter().all(|lookup| lookup.matches(document))
    }
}

impl FilterableQuery for DocumentQuery {
    fn apply_clause(mut self, clause: &FilterClause) -> Self {
        let field = clause.field.as_str();
        match &clause.condition {
            Condition::Text { mode, term } => {
                self.lookups.push(Lookup {
                    field: field.to_string(),
                    op: LookupOp::Text(*mode),
                    value: Value::String(term.clone()),
                });
            }
            Condition::Equal(value) => {
                self.lookups.push(Lookup {
                    field: field.to_string(),
                    op: LookupOp::Exact,
                    value: value.clone(),
                });
            }
            Condition::Between(low, high) => {
                self = self
                    .filter(&format!("{field}__gte"), low.clone())
                    .filter(&format!("{field}__lte"), high.clone());
            }
        }
        self
    }
}
