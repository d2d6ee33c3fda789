//! Backend-neutral filter conditions.
//!
//! Filters never touch a query directly. They produce a [`FilterClause`],
//! and each data layer translates clauses into its own query language
//! through [`FilterableQuery`].

use serde_json::Value;

/// How a text condition compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    /// Equal, case-sensitive.
    Exact,
    /// Equal, ignoring case.
    IExact,
    /// Substring, case-sensitive.
    Contains,
    /// Substring, ignoring case.
    IContains,
    /// Prefix, case-sensitive.
    StartsWith,
    /// Prefix, ignoring case.
    IStartsWith,
    /// Suffix, case-sensitive.
    EndsWith,
    /// Suffix, ignoring case.
    IEndsWith,
}

impl TextMatch {
    /// Returns `true` if the comparison ignores case.
    pub const fn is_case_insensitive(self) -> bool {
        matches!(
            self,
            Self::IExact | Self::IContains | Self::IStartsWith | Self::IEndsWith
        )
    }

    /// Tests `haystack` against `term`.
    pub fn matches(self, haystack: &str, term: &str) -> bool {
        if self.is_case_insensitive() {
            let haystack = haystack.to_lowercase();
            let term = term.to_lowercase();
            self.compare(&haystack, &term)
        } else {
            self.compare(haystack, term)
        }
    }

    fn compare(self, haystack: &str, term: &str) -> bool {
        match self {
            Self::Exact | Self::IExact => haystack == term,
            Self::Contains | Self::IContains => haystack.contains(term),
            Self::StartsWith | Self::IStartsWith => haystack.starts_with(term),
            Self::EndsWith | Self::IEndsWith => haystack.ends_with(term),
        }
    }

    /// A SQL `LIKE` pattern for `term`, with `\` as the escape character.
    pub fn like_pattern(self, term: &str) -> String {
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        match self {
            Self::Exact | Self::IExact => escaped,
            Self::Contains | Self::IContains => format!("%{escaped}%"),
            Self::StartsWith | Self::IStartsWith => format!("{escaped}%"),
            Self::EndsWith | Self::IEndsWith => format!("%{escaped}"),
        }
    }
}

/// Reads the search syntax of free-text filters.
///
/// `^term` matches a prefix, `=term` matches exactly, anything else is a
/// substring match. All three ignore case.
pub fn parse_like_term(term: &str) -> (TextMatch, String) {
    if let Some(rest) = term.strip_prefix('^') {
        (TextMatch::IStartsWith, rest.to_string())
    } else if let Some(rest) = term.strip_prefix('=') {
        (TextMatch::IExact, rest.to_string())
    } else {
        (TextMatch::IContains, term.to_string())
    }
}

/// One condition on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A text comparison.
    Text {
        /// How to compare.
        mode: TextMatch,
        /// The search term.
        term: String,
    },
    /// Equality with a typed value.
    Equal(Value),
    /// Inclusive range.
    Between(Value, Value),
}

/// A condition bound to the field it constrains.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    /// The field name.
    pub field: String,
    /// The condition.
    pub condition: Condition,
}

impl FilterClause {
    /// A clause on `field`.
    pub fn new(field: impl Into<String>, condition: Condition) -> Self {
        Self {
            field: field.into(),
            condition,
        }
    }
}

/// A query that can be narrowed by filter clauses.
pub trait FilterableQuery: Sized {
    /// Returns the query narrowed by `clause`.
    #[must_use]
    fn apply_clause(self, clause: &FilterClause) -> Self;
}
