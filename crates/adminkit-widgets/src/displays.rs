//! Read-only renderers for list cells.
//!
//! Every field of a resource carries a [`Display`]. Most render a value with
//! a template; [`InputOnly`] marks a field that never shows up on list pages.

use std::fmt;
use std::sync::Arc;

use adminkit_core::AdminResult;
use async_trait::async_trait;
use serde_json::Value;

use crate::options::EnumChoices;
use crate::widget::{parse_datetime, RenderContext, Widget};

/// Enumerates the built-in display kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayType {
    /// The value as text.
    Raw,
    /// A formatted datetime.
    Datetime,
    /// A formatted date.
    Date,
    /// Excluded from list pages.
    InputOnly,
    /// A true/false badge.
    Boolean,
    /// An `<img>` tag.
    Image,
    /// Pretty-printed JSON.
    Json,
    /// The member name of an enum value.
    Enum,
}

impl fmt::Display for DisplayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raw => "Raw",
            Self::Datetime => "Datetime",
            Self::Date => "Date",
            Self::InputOnly => "InputOnly",
            Self::Boolean => "Boolean",
            Self::Image => "Image",
            Self::Json => "Json",
            Self::Enum => "Enum",
        };
        write!(f, "{name}")
    }
}

/// Renders a stored value for a list cell.
#[async_trait]
pub trait Display: Send + Sync + fmt::Debug {
    /// The kind of this display.
    fn display_type(&self) -> DisplayType;

    /// The underlying widget.
    fn widget(&self) -> &Widget;

    /// Renders `value`. Null renders as an empty string.
    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        self.widget().render(cx, value)
    }
}

// ---------------------------------------------------------------------------
// Built-in displays
// ---------------------------------------------------------------------------

/// Shows the value as text.
#[derive(Debug, Clone, Default)]
pub struct Raw {
    widget: Widget,
}

impl Raw {
    /// A raw display.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for Raw {
    fn display_type(&self) -> DisplayType {
        DisplayType::Raw
    }

    fn widget(&self) -> &Widget {
        &self.widget
    }
}

/// Reformats datetime values with a strftime pattern.
///
/// Values that do not parse as datetimes are shown unchanged.
#[derive(Debug, Clone)]
pub struct DatetimeDisplay {
    widget: Widget,
    format: String,
}

impl Default for DatetimeDisplay {
    fn default() -> Self {
        Self::new("%Y-%m-%d %H:%M:%S")
    }
}

impl DatetimeDisplay {
    /// A datetime display with a strftime `format`.
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            widget: Widget::raw(),
            format: format.into(),
        }
    }
}

#[async_trait]
impl Display for DatetimeDisplay {
    fn display_type(&self) -> DisplayType {
        DisplayType::Datetime
    }

    fn widget(&self) -> &Widget {
        &self.widget
    }

    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        let formatted = value
            .as_str()
            .and_then(parse_datetime)
            .map(|dt| Value::String(dt.format(&self.format).to_string()));
        self.widget.render(cx, formatted.as_ref().unwrap_or(value))
    }
}

/// Reformats date values, `%Y-%m-%d` by default.
#[derive(Debug, Clone)]
pub struct DateDisplay(DatetimeDisplay);

impl Default for DateDisplay {
    fn default() -> Self {
        Self::new("%Y-%m-%d")
    }
}

impl DateDisplay {
    /// A date display with a strftime `format`.
    pub fn new(format: impl Into<String>) -> Self {
        Self(DatetimeDisplay::new(format))
    }
}

#[async_trait]
impl Display for DateDisplay {
    fn display_type(&self) -> DisplayType {
        DisplayType::Date
    }

    fn widget(&self) -> &Widget {
        &self.0.widget
    }

    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        self.0.render(cx, value).await
    }
}

/// Marks a field as form-only. Such fields have no list column.
#[derive(Debug, Clone, Default)]
pub struct InputOnly {
    widget: Widget,
}

impl InputOnly {
    /// An input-only marker.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for InputOnly {
    fn display_type(&self) -> DisplayType {
        DisplayType::InputOnly
    }

    fn widget(&self) -> &Widget {
        &self.widget
    }
}

/// A translated true/false badge.
#[derive(Debug, Clone)]
pub struct Boolean {
    widget: Widget,
}

impl Default for Boolean {
    fn default() -> Self {
        Self::new()
    }
}

impl Boolean {
    /// A boolean badge.
    pub fn new() -> Self {
        Self {
            widget: Widget::new("widgets/displays/boolean.html"),
        }
    }
}

#[async_trait]
impl Display for Boolean {
    fn display_type(&self) -> DisplayType {
        DisplayType::Boolean
    }

    fn widget(&self) -> &Widget {
        &self.widget
    }

    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        // SQLite stores booleans as 0/1 and some drivers hand back "0"/"1".
        let truthy = match value {
            Value::Null => return Ok(String::new()),
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => !matches!(s.as_str(), "" | "0" | "false" | "False"),
            _ => true,
        };
        self.widget.render(cx, &Value::Bool(truthy))
    }
}

/// An image tag pointing at the stored URL.
#[derive(Debug, Clone)]
pub struct Image {
    widget: Widget,
}

impl Image {
    /// An image with optional `width` and `height` attributes.
    pub fn new(width: Option<&str>, height: Option<&str>) -> Self {
        Self {
            widget: Widget::new("widgets/displays/image.html")
                .with("width", width.map(str::to_string))
                .with("height", height.map(str::to_string)),
        }
    }
}

impl Default for Image {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl Display for Image {
    fn display_type(&self) -> DisplayType {
        DisplayType::Image
    }

    fn widget(&self) -> &Widget {
        &self.widget
    }
}

/// Serializes JSON values for display.
pub type JsonDumper = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// The default dumper: pretty-printed with two-space indentation.
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Pretty-printed JSON.
///
/// Text that holds a JSON document is parsed first, so columns stored as
/// `TEXT` render the same as native JSON columns.
#[derive(Clone)]
pub struct Json {
    widget: Widget,
    dumper: JsonDumper,
}

impl fmt::Debug for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Json")
            .field("widget", &self.widget)
            .finish_non_exhaustive()
    }
}

impl Default for Json {
    fn default() -> Self {
        Self::new()
    }
}

impl Json {
    /// A JSON display using [`pretty_json`].
    pub fn new() -> Self {
        Self {
            widget: Widget::new("widgets/displays/json.html"),
            dumper: Arc::new(pretty_json),
        }
    }

    /// Replaces the serializer.
    #[must_use]
    pub fn dumper(mut self, dumper: JsonDumper) -> Self {
        self.dumper = dumper;
        self
    }
}

#[async_trait]
impl Display for Json {
    fn display_type(&self) -> DisplayType {
        DisplayType::Json
    }

    fn widget(&self) -> &Widget {
        &self.widget
    }

    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        let document = match value {
            Value::Null => return Ok(String::new()),
            Value::String(text) => serde_json::from_str(text).unwrap_or_else(|_| value.clone()),
            other => other.clone(),
        };
        self.widget
            .render(cx, &Value::String((self.dumper)(&document)))
    }
}

/// Shows the member name of an enum value, or the raw value when no member
/// matches.
#[derive(Debug, Clone)]
pub struct EnumDisplay {
    widget: Widget,
    choices: EnumChoices,
}

impl EnumDisplay {
    /// An enum display over `choices`.
    pub fn new(choices: EnumChoices) -> Self {
        Self {
            widget: Widget::raw(),
            choices,
        }
    }
}

#[async_trait]
impl Display for EnumDisplay {
    fn display_type(&self) -> DisplayType {
        DisplayType::Enum
    }

    fn widget(&self) -> &Widget {
        &self.widget
    }

    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        match self.choices.name_of(value) {
            Some(name) => Ok(name.to_string()),
            None => self.widget.render(cx, value),
        }
    }
}
