//! Where select, radio, and many-to-many widgets get their choices.
//!
//! Options are `(label, value)` pairs. Static choices are known when the
//! resource is declared; related-model choices come from the data layer at
//! render time, through an [`OptionsSource`] the backend provides.

use std::fmt;

use adminkit_core::AdminResult;
use async_trait::async_trait;
use serde_json::Value;

/// Supplies `(label, value)` options.
#[async_trait]
pub trait OptionsSource: Send + Sync + fmt::Debug {
    /// The options, in display order.
    async fn options(&self) -> AdminResult<Vec<(String, Value)>>;
}

/// A fixed list of options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticOptions(pub Vec<(String, Value)>);

impl StaticOptions {
    /// Options from `(label, value)` pairs.
    pub fn new<L, V>(options: impl IntoIterator<Item = (L, V)>) -> Self
    where
        L: Into<String>,
        V: Into<Value>,
    {
        Self(
            options
                .into_iter()
                .map(|(label, value)| (label.into(), value.into()))
                .collect(),
        )
    }
}

#[async_trait]
impl OptionsSource for StaticOptions {
    async fn options(&self) -> AdminResult<Vec<(String, Value)>> {
        Ok(self.0.clone())
    }
}

/// The kind of value an enum's members carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumKind {
    /// Integer-valued members.
    Int,
    /// String-valued members.
    #[default]
    Str,
}

/// Named members of an enumerated field.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumChoices {
    kind: EnumKind,
    members: Vec<(String, Value)>,
}

impl EnumChoices {
    /// Integer members as `(name, value)` pairs.
    pub fn ints<S: Into<String>>(members: impl IntoIterator<Item = (S, i64)>) -> Self {
        Self {
            kind: EnumKind::Int,
            members: members
                .into_iter()
                .map(|(name, value)| (name.into(), Value::from(value)))
                .collect(),
        }
    }

    /// String members as `(name, value)` pairs.
    pub fn strs<S: Into<String>, V: Into<String>>(
        members: impl IntoIterator<Item = (S, V)>,
    ) -> Self {
        Self {
            kind: EnumKind::Str,
            members: members
                .into_iter()
                .map(|(name, value)| (name.into(), Value::String(value.into())))
                .collect(),
        }
    }

    /// The member value kind.
    pub fn kind(&self) -> EnumKind {
        self.kind
    }

    /// Members as `(name, value)` pairs.
    pub fn members(&self) -> &[(String, Value)] {
        &self.members
    }

    /// Coerces a submitted string to a member value.
    ///
    /// Returns `None` when the string does not name a member value.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let candidate = match self.kind {
            EnumKind::Int => Value::from(raw.trim().parse::<i64>().ok()?),
            EnumKind::Str => Value::String(raw.to_string()),
        };
        self.members
            .iter()
            .any(|(_, value)| *value == candidate)
            .then_some(candidate)
    }

    /// The member name for a stored value.
    pub fn name_of(&self, value: &Value) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, member)| member == value || loosely_equal(member, value))
            .map(|(name, _)| name.as_str())
    }
}

/// Compares a member with a value that may have been stored as text.
fn loosely_equal(member: &Value, value: &Value) -> bool {
    match (member, value) {
        (Value::Number(n), Value::String(s)) => n.to_string() == *s,
        _ => false,
    }
}
