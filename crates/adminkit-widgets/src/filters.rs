//! List filters.
//!
//! A [`Filter`] renders one control above the list table and turns the
//! matching query parameter into a [`FilterClause`]. Values that fail
//! validation are skipped, leaving the query as it was.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use adminkit_core::{AdminError, AdminResult};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde_json::Value;

use crate::clause::{parse_like_term, Condition, FilterClause, FilterableQuery, TextMatch};
use crate::options::{EnumChoices, OptionsSource};
use crate::widget::{parse_datetime, stringify_options, title_case, RenderContext, Widget};

/// The layout range bounds are normalized to before they reach a backend.
pub const DATETIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Enumerates the built-in filter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// Free-text search.
    Search,
    /// A range of dates.
    DateRange,
    /// A range of datetimes.
    DateTimeRange,
    /// Equality with an enum member.
    Enum,
    /// True or false.
    Boolean,
    /// Equality with one of a set of options.
    Select,
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Search => "Search",
            Self::DateRange => "DateRange",
            Self::DateTimeRange => "DateTimeRange",
            Self::Enum => "Enum",
            Self::Boolean => "Boolean",
            Self::Select => "Select",
        };
        write!(f, "{name}")
    }
}

/// The widget shared by every filter.
///
/// The context always carries `name`, `label`, `placeholder`, and `null`.
/// `null` defaults to `true`, which offers a blank choice in selects.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBase {
    widget: Widget,
}

impl FilterBase {
    /// A filter on `name` rendering `template`, labelled from the name.
    pub fn new(template: &str, name: &str) -> Self {
        Self {
            widget: Widget::new(template)
                .with("name", name)
                .with("label", title_case(name))
                .with("placeholder", "")
                .with("null", true),
        }
    }

    /// The widget.
    pub fn widget(&self) -> &Widget {
        &self.widget
    }
}

/// A list filter.
#[async_trait]
pub trait Filter: Send + Sync + fmt::Debug {
    /// The kind of this filter.
    fn filter_type(&self) -> FilterType;

    /// The shared state.
    fn base(&self) -> &FilterBase;

    /// The shared state, mutably.
    fn base_mut(&mut self) -> &mut FilterBase;

    /// The widget.
    fn widget(&self) -> &Widget {
        &self.base().widget
    }

    /// The query parameter and field this filter reads and constrains.
    fn name(&self) -> &str {
        self.widget().get_str("name")
    }

    /// The label shown above the control.
    fn label(&self) -> &str {
        self.widget().get_str("label")
    }

    /// Whether a blank choice is offered.
    fn is_nullable(&self) -> bool {
        self.widget().get_bool("null")
    }

    /// Sets the label.
    fn set_label(&mut self, label: &str) {
        self.base_mut().widget.set("label", label);
    }

    /// Sets the placeholder.
    fn set_placeholder(&mut self, placeholder: &str) {
        self.base_mut().widget.set("placeholder", placeholder);
    }

    /// Sets whether a blank choice is offered.
    fn set_null(&mut self, null: bool) {
        self.base_mut().widget.set("null", null);
    }

    /// Rejects values that cannot narrow the query.
    fn validate(&self, raw: &str) -> AdminResult<()> {
        if raw.trim().is_empty() {
            return Err(AdminError::FilterValidation(format!(
                "Empty value for filter '{}'",
                self.name()
            )));
        }
        Ok(())
    }

    /// The condition a validated value stands for.
    fn condition(&self, raw: &str) -> AdminResult<Condition>;

    /// Validates `raw` and binds its condition to this filter's field.
    fn clause(&self, raw: &str) -> AdminResult<FilterClause> {
        self.validate(raw)?;
        Ok(FilterClause::new(self.name(), self.condition(raw)?))
    }

    /// Renders the control, pre-filled with the current query value.
    async fn render(&self, cx: &RenderContext<'_>, raw: Option<&str>) -> AdminResult<String> {
        self.widget().render_with(
            cx,
            &Value::String(raw.unwrap_or_default().to_string()),
            std::iter::empty::<(&str, Value)>(),
        )
    }
}

/// Narrows `query` by `filter` when `raw` is a valid value for it.
pub fn apply_filter<Q: FilterableQuery>(filter: &dyn Filter, query: Q, raw: &str) -> Q {
    match filter.clause(raw) {
        Ok(clause) => query.apply_clause(&clause),
        Err(e) => {
            tracing::debug!(filter = %filter.name(), error = %e, "Skipping filter value");
            query
        }
    }
}

/// Narrows `query` by every filter with a value in `params`.
pub fn apply_filters<Q: FilterableQuery>(
    filters: &[Arc<dyn Filter>],
    params: &HashMap<String, String>,
    query: Q,
) -> Q {
    filters.iter().fold(query, |query, filter| {
        match params.get(filter.name()) {
            Some(raw) => apply_filter(filter.as_ref(), query, raw),
            None => query,
        }
    })
}

/// Adds the builder setters to a filter type.
macro_rules! filter_builder {
    ($($ty:ty),* $(,)?) => {$(
        impl $ty {
            /// Sets the label.
            #[must_use]
            pub fn with_label(mut self, label: &str) -> Self {
                self.set_label(label);
                self
            }

            /// Sets the placeholder.
            #[must_use]
            pub fn placeholder(mut self, placeholder: &str) -> Self {
                self.set_placeholder(placeholder);
                self
            }

            /// Sets whether a blank choice is offered.
            #[must_use]
            pub fn null(mut self, null: bool) -> Self {
                self.set_null(null);
                self
            }
        }
    )*};
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// How a [`Search`] filter compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Exact equality.
    Equal,
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
    /// Equality, ignoring case.
    IExact,
    /// The `^prefix`, `=exact`, and substring syntax of [`parse_like_term`].
    #[default]
    Term,
}

/// A free-text search box.
#[derive(Debug, Clone)]
pub struct Search {
    base: FilterBase,
    mode: SearchMode,
}

impl Search {
    /// A search on `name` using the term syntax.
    pub fn new(name: &str) -> Self {
        Self::with_mode(name, SearchMode::Term)
    }

    /// A search on `name` with an explicit mode.
    pub fn with_mode(name: &str, mode: SearchMode) -> Self {
        Self {
            base: FilterBase::new("widgets/filters/search.html", name),
            mode,
        }
    }

    /// The comparison mode.
    pub fn mode(&self) -> SearchMode {
        self.mode
    }
}

impl Filter for Search {
    fn filter_type(&self) -> FilterType {
        FilterType::Search
    }

    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn condition(&self, raw: &str) -> AdminResult<Condition> {
        let text = |mode| Condition::Text {
            mode,
            term: raw.to_string(),
        };
        Ok(match self.mode {
            SearchMode::Equal => Condition::Equal(Value::String(raw.to_string())),
            SearchMode::Contains => text(TextMatch::Contains),
            SearchMode::IContains => text(TextMatch::IContains),
            SearchMode::StartsWith => text(TextMatch::StartsWith),
            SearchMode::IStartsWith => text(TextMatch::IStartsWith),
            SearchMode::EndsWith => text(TextMatch::EndsWith),
            SearchMode::IEndsWith => text(TextMatch::IEndsWith),
            SearchMode::IExact => text(TextMatch::IExact),
            SearchMode::Term => {
                let (mode, term) = parse_like_term(raw);
                Condition::Text { mode, term }
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Date ranges
// ---------------------------------------------------------------------------

/// The parsed bounds of a date-range filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeDTO {
    /// Inclusive lower bound.
    pub start: NaiveDateTime,
    /// Inclusive upper bound.
    pub end: NaiveDateTime,
}

impl DateRangeDTO {
    /// Parses `"start - end"`. A bare date stands for its midnight.
    pub fn parse(raw: &str) -> AdminResult<Self> {
        let invalid = || AdminError::FilterValidation(format!("Invalid date range '{raw}'"));
        let (start, end) = raw.split_once(" - ").ok_or_else(invalid)?;
        let start = parse_datetime(start).ok_or_else(invalid)?;
        let end = parse_datetime(end).ok_or_else(invalid)?;
        if end < start {
            return Err(AdminError::FilterValidation(format!(
                "Date range '{raw}' ends before it starts"
            )));
        }
        Ok(Self { start, end })
    }
}

/// A date or datetime range picker.
///
/// The value `"2024-01-01 - 2024-01-31"` becomes an inclusive range from
/// `2024-01-01 00:00:00` to `2024-01-31 00:00:00`.
#[derive(Debug, Clone)]
pub struct DateRange {
    base: FilterBase,
    kind: FilterType,
}

impl DateRange {
    /// A date range on `name`, picked as `Y-m-d`.
    pub fn new(name: &str) -> Self {
        Self::picker(name, FilterType::DateRange, true, "Y-m-d")
    }

    /// A datetime range on `name`, picked as `Y-m-d H:i:S`.
    pub fn datetime(name: &str) -> Self {
        Self::picker(name, FilterType::DateTimeRange, false, "Y-m-d H:i:S")
    }

    fn picker(name: &str, kind: FilterType, date: bool, format: &str) -> Self {
        let mut base = FilterBase::new("widgets/filters/datetime.html", name);
        base.widget.set("date", date);
        base.widget.set("format", format);
        Self { base, kind }
    }
}

impl Filter for DateRange {
    fn filter_type(&self) -> FilterType {
        self.kind
    }

    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn condition(&self, raw: &str) -> AdminResult<Condition> {
        let range = DateRangeDTO::parse(raw)?;
        Ok(Condition::Between(
            Value::String(range.start.format(DATETIME_LAYOUT).to_string()),
            Value::String(range.end.format(DATETIME_LAYOUT).to_string()),
        ))
    }
}

// ---------------------------------------------------------------------------
// Choice filters
// ---------------------------------------------------------------------------

/// Equality with an enum member.
#[derive(Debug, Clone)]
pub struct Enum {
    base: FilterBase,
    choices: EnumChoices,
}

impl Enum {
    /// An enum filter on `name`.
    pub fn new(name: &str, choices: EnumChoices) -> Self {
        Self {
            base: FilterBase::new("widgets/filters/select.html", name),
            choices,
        }
    }
}

#[async_trait]
impl Filter for Enum {
    fn filter_type(&self) -> FilterType {
        FilterType::Enum
    }

    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn condition(&self, raw: &str) -> AdminResult<Condition> {
        self.choices.coerce(raw).map(Condition::Equal).ok_or_else(|| {
            AdminError::FilterValidation(format!("'{raw}' is not a member of {}", self.name()))
        })
    }

    async fn render(&self, cx: &RenderContext<'_>, raw: Option<&str>) -> AdminResult<String> {
        let mut options = self.choices.members().to_vec();
        if self.is_nullable() {
            options.insert(0, (String::new(), Value::String(String::new())));
        }
        self.base.widget.render_with(
            cx,
            &Value::String(raw.unwrap_or_default().to_string()),
            [("options", stringify_options(&options))],
        )
    }
}

/// True or false, with translated choices.
#[derive(Debug, Clone)]
pub struct Boolean {
    base: FilterBase,
}

impl Boolean {
    /// A boolean filter on `name`.
    pub fn new(name: &str) -> Self {
        Self {
            base: FilterBase::new("widgets/filters/select.html", name),
        }
    }
}

#[async_trait]
impl Filter for Boolean {
    fn filter_type(&self) -> FilterType {
        FilterType::Boolean
    }

    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn condition(&self, raw: &str) -> AdminResult<Condition> {
        Ok(Condition::Equal(Value::Bool(raw == "true")))
    }

    async fn render(&self, cx: &RenderContext<'_>, raw: Option<&str>) -> AdminResult<String> {
        let mut options = vec![
            (cx.t("TRUE"), "true".to_string()),
            (cx.t("FALSE"), "false".to_string()),
        ];
        if self.is_nullable() {
            options.insert(0, (String::new(), String::new()));
        }
        self.base.widget.render_with(
            cx,
            &Value::String(raw.unwrap_or_default().to_string()),
            [("options", options)],
        )
    }
}

/// Equality with one of a set of options.
///
/// The submitted text is matched against the stringified option values and
/// the option's typed value is used in the condition.
#[derive(Debug, Clone)]
pub struct Select {
    base: FilterBase,
    options: Arc<dyn OptionsSource>,
    cached: Vec<(String, Value)>,
}

impl Select {
    /// A select filter on `name` over options known up front.
    pub fn new(name: &str, options: Vec<(String, Value)>) -> Self {
        Self {
            base: FilterBase::new("widgets/filters/select.html", name),
            options: Arc::new(crate::options::StaticOptions(options.clone())),
            cached: options,
        }
    }

    /// A select filter on `name` over options fetched at render time.
    ///
    /// Submitted values are compared as text since the options are not known
    /// when the query is built.
    pub fn from_source(name: &str, options: Arc<dyn OptionsSource>) -> Self {
        Self {
            base: FilterBase::new("widgets/filters/select.html", name),
            options,
            cached: Vec::new(),
        }
    }
}

#[async_trait]
impl Filter for Select {
    fn filter_type(&self) -> FilterType {
        FilterType::Select
    }

    fn base(&self) -> &FilterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FilterBase {
        &mut self.base
    }

    fn condition(&self, raw: &str) -> AdminResult<Condition> {
        if self.cached.is_empty() {
            return Ok(Condition::Equal(Value::String(raw.to_string())));
        }
        stringify_options(&self.cached)
            .iter()
            .position(|(_, value)| value == raw)
            .map(|index| Condition::Equal(self.cached[index].1.clone()))
            .ok_or_else(|| {
                AdminError::FilterValidation(format!("'{raw}' is not an option of {}", self.name()))
            })
    }

    async fn render(&self, cx: &RenderContext<'_>, raw: Option<&str>) -> AdminResult<String> {
        let mut options = self.options.options().await?;
        if self.is_nullable() {
            options.insert(0, (String::new(), Value::String(String::new())));
        }
        self.base.widget.render_with(
            cx,
            &Value::String(raw.unwrap_or_default().to_string()),
            [("options", stringify_options(&options))],
        )
    }
}

filter_builder!(Search, DateRange, Enum, Boolean, Select);
