//! Form controls.
//!
//! An [`Input`] renders the control for one field on the create and update
//! pages and parses the submitted [`FormData`] back into a value. Parsing
//! returns `Ok(None)` when the form carries nothing for the field, which
//! leaves the stored value untouched.

use std::fmt;
use std::sync::Arc;

use adminkit_core::files::FileManager;
use adminkit_core::{AdminError, AdminResult};
use adminkit_http::FormData;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::displays::{pretty_json, JsonDumper};
use crate::options::{EnumChoices, EnumKind, OptionsSource};
use crate::widget::{stringify_options, value_to_string, RenderContext, Widget};

/// Enumerates the built-in input kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    /// `<input>` with a configurable type.
    Text,
    /// Shown on the list page only; never part of a form.
    DisplayOnly,
    /// `<select>` over a fixed option list.
    Select,
    /// `<select>` over the rows of a related model.
    ForeignKey,
    /// `<select multiple>` over the rows of a related model.
    ManyToMany,
    /// `<select>` over enum members.
    Enum,
    /// A JSON editor.
    Json,
    /// `<textarea>`.
    TextArea,
    /// A markdown editor.
    Editor,
    /// A datetime picker.
    DateTime,
    /// A date picker.
    Date,
    /// A file upload.
    File,
    /// An image upload with preview.
    Image,
    /// Radio buttons over a fixed option list.
    Radio,
    /// Radio buttons over enum members.
    RadioEnum,
    /// A checkbox switch.
    Switch,
    /// `<input type="number">`.
    Number,
    /// A color picker.
    Color,
}

impl InputType {
    /// Returns `true` for uploads, which make a form `multipart/form-data`.
    pub const fn is_file(self) -> bool {
        matches!(self, Self::File | Self::Image)
    }

    /// Returns `true` for inputs that never render on forms.
    pub const fn is_display_only(self) -> bool {
        matches!(self, Self::DisplayOnly)
    }

    /// Returns `true` for multi-valued relation inputs.
    pub const fn is_many_to_many(self) -> bool {
        matches!(self, Self::ManyToMany)
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "Text",
            Self::DisplayOnly => "DisplayOnly",
            Self::Select => "Select",
            Self::ForeignKey => "ForeignKey",
            Self::ManyToMany => "ManyToMany",
            Self::Enum => "Enum",
            Self::Json => "Json",
            Self::TextArea => "TextArea",
            Self::Editor => "Editor",
            Self::DateTime => "DateTime",
            Self::Date => "Date",
            Self::File => "File",
            Self::Image => "Image",
            Self::Radio => "Radio",
            Self::RadioEnum => "RadioEnum",
            Self::Switch => "Switch",
            Self::Number => "Number",
            Self::Color => "Color",
        };
        write!(f, "{name}")
    }
}

/// State shared by every input: its widget and default value.
///
/// The widget context always carries `name`, `label`, `null`, `help_text`,
/// `disabled`, `placeholder`, and `input_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBase {
    widget: Widget,
    default: Value,
}

impl InputBase {
    /// A base rendering `template`.
    pub fn new(template: &str) -> Self {
        Self {
            widget: Widget::new(template)
                .with("name", "")
                .with("label", "")
                .with("null", false)
                .with("help_text", Value::Null)
                .with("disabled", false)
                .with("placeholder", "")
                .with("input_type", "text"),
            default: Value::Null,
        }
    }

    /// The widget.
    pub fn widget(&self) -> &Widget {
        &self.widget
    }

    /// The widget, mutably.
    pub fn widget_mut(&mut self) -> &mut Widget {
        &mut self.widget
    }
}

/// A form control.
///
/// Implementors store an [`InputBase`]; configuration goes through the
/// provided setters so every input shares the same context keys.
#[async_trait]
pub trait Input: Send + Sync + fmt::Debug {
    /// The kind of this input.
    fn input_type(&self) -> InputType;

    /// The shared state.
    fn base(&self) -> &InputBase;

    /// The shared state, mutably.
    fn base_mut(&mut self) -> &mut InputBase;

    /// The widget.
    fn widget(&self) -> &Widget {
        &self.base().widget
    }

    /// The form field name.
    fn name(&self) -> &str {
        self.widget().get_str("name")
    }

    /// Whether the field accepts null.
    fn is_nullable(&self) -> bool {
        self.widget().get_bool("null")
    }

    /// The value rendered when the stored value is null.
    fn default_value(&self) -> &Value {
        &self.base().default
    }

    /// Binds the input to a field and its label.
    fn bind(&mut self, name: &str, label: &str) {
        let widget = &mut self.base_mut().widget;
        widget.set("name", name);
        widget.set("label", label);
    }

    /// Marks the field as nullable.
    fn set_null(&mut self, null: bool) {
        self.base_mut().widget.set("null", null);
    }

    /// Sets the value rendered for null.
    fn set_default(&mut self, default: Value) {
        self.base_mut().default = default;
    }

    /// Sets the help text shown under the control.
    fn set_help_text(&mut self, help_text: &str) {
        self.base_mut().widget.set("help_text", help_text);
    }

    /// Disables the control.
    fn set_disabled(&mut self, disabled: bool) {
        self.base_mut().widget.set("disabled", disabled);
    }

    /// Sets the placeholder text.
    fn set_placeholder(&mut self, placeholder: &str) {
        self.base_mut().widget.set("placeholder", placeholder);
    }

    /// Reads this field from a submitted form.
    ///
    /// An empty string on a nullable field parses as null.
    async fn parse(&self, form: &FormData) -> AdminResult<Option<Value>> {
        Ok(form.get(self.name()).map(|raw| {
            if raw.is_empty() && self.is_nullable() {
                Value::Null
            } else {
                Value::String(raw.to_string())
            }
        }))
    }

    /// Renders the control showing `value`, or the default when it is null.
    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        let value = if value.is_null() {
            self.default_value()
        } else {
            value
        };
        let shown = Value::String(value_to_string(value));
        self.widget()
            .render_with(cx, &shown, std::iter::empty::<(&str, Value)>())
    }
}

/// Adds the builder setters to an input type.
macro_rules! input_builder {
    ($($ty:ty),* $(,)?) => {$(
        impl $ty {
            /// Marks the field as nullable.
            #[must_use]
            pub fn null(mut self, null: bool) -> Self {
                self.set_null(null);
                self
            }

            /// Sets the value rendered for null.
            #[must_use]
            pub fn with_default(mut self, default: impl Into<Value>) -> Self {
                self.set_default(default.into());
                self
            }

            /// Sets the help text.
            #[must_use]
            pub fn help_text(mut self, help_text: &str) -> Self {
                self.set_help_text(help_text);
                self
            }

            /// Disables the control.
            #[must_use]
            pub fn disabled(mut self, disabled: bool) -> Self {
                self.set_disabled(disabled);
                self
            }

            /// Sets the placeholder.
            #[must_use]
            pub fn placeholder(mut self, placeholder: &str) -> Self {
                self.set_placeholder(placeholder);
                self
            }
        }
    )*};
}

// ---------------------------------------------------------------------------
// Text inputs
// ---------------------------------------------------------------------------

/// An `<input>` element, `type="text"` unless configured otherwise.
#[derive(Debug, Clone)]
pub struct Text {
    base: InputBase,
    kind: InputType,
}

impl Default for Text {
    fn default() -> Self {
        Self::new()
    }
}

impl Text {
    /// A text input.
    pub fn new() -> Self {
        Self::with_type("text")
    }

    /// An input with an explicit HTML `type`.
    pub fn with_type(input_type: &str) -> Self {
        let mut base = InputBase::new("widgets/inputs/input.html");
        base.widget.set("input_type", input_type);
        Self {
            base,
            kind: InputType::Text,
        }
    }

    /// An `<input type="email">`.
    pub fn email() -> Self {
        Self::with_type("email")
    }

    /// An `<input type="password">`.
    pub fn password() -> Self {
        Self::with_type("password")
    }
}

#[async_trait]
impl Input for Text {
    fn input_type(&self) -> InputType {
        self.kind
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }
}

/// A field that is listed but never edited.
#[derive(Debug, Clone)]
pub struct DisplayOnly {
    base: InputBase,
}

impl Default for DisplayOnly {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayOnly {
    /// A display-only marker.
    pub fn new() -> Self {
        Self {
            base: InputBase::new(""),
        }
    }
}

#[async_trait]
impl Input for DisplayOnly {
    fn input_type(&self) -> InputType {
        InputType::DisplayOnly
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }

    async fn parse(&self, _form: &FormData) -> AdminResult<Option<Value>> {
        Ok(None)
    }

    async fn render(&self, _cx: &RenderContext<'_>, _value: &Value) -> AdminResult<String> {
        Ok(String::new())
    }
}

/// `<input type="number">`, parsed into a JSON number.
#[derive(Debug, Clone)]
pub struct Number {
    base: InputBase,
}

impl Default for Number {
    fn default() -> Self {
        Self::new()
    }
}

impl Number {
    /// A number input.
    pub fn new() -> Self {
        let mut base = InputBase::new("widgets/inputs/input.html");
        base.widget.set("input_type", "number");
        Self { base }
    }
}

#[async_trait]
impl Input for Number {
    fn input_type(&self) -> InputType {
        InputType::Number
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }

    async fn parse(&self, form: &FormData) -> AdminResult<Option<Value>> {
        let Some(raw) = form.get(self.name()).map(str::trim) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return if self.is_nullable() {
                Ok(Some(Value::Null))
            } else {
                Err(AdminError::Validation(format!("{} is required", self.name())))
            };
        }
        if let Ok(int) = raw.parse::<i64>() {
            return Ok(Some(Value::from(int)));
        }
        raw.parse::<f64>()
            .ok()
            .and_then(|float| serde_json::Number::from_f64(float).map(Value::Number))
            .map(Some)
            .ok_or_else(|| {
                AdminError::Validation(format!("{} must be a number, got '{raw}'", self.name()))
            })
    }
}

/// A multi-line `<textarea>`.
#[derive(Debug, Clone)]
pub struct TextArea {
    base: InputBase,
}

impl Default for TextArea {
    fn default() -> Self {
        Self::new()
    }
}

impl TextArea {
    /// A textarea.
    pub fn new() -> Self {
        Self {
            base: InputBase::new("widgets/inputs/textarea.html"),
        }
    }
}

#[async_trait]
impl Input for TextArea {
    fn input_type(&self) -> InputType {
        InputType::TextArea
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }
}

/// A markdown editor.
#[derive(Debug, Clone)]
pub struct Editor {
    base: InputBase,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// A markdown editor.
    pub fn new() -> Self {
        Self {
            base: InputBase::new("widgets/inputs/editor.html"),
        }
    }
}

#[async_trait]
impl Input for Editor {
    fn input_type(&self) -> InputType {
        InputType::Editor
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }
}

/// A color picker.
#[derive(Debug, Clone)]
pub struct Color {
    base: InputBase,
}

impl Default for Color {
    fn default() -> Self {
        Self::new()
    }
}

impl Color {
    /// A color picker.
    pub fn new() -> Self {
        Self {
            base: InputBase::new("widgets/inputs/color.html"),
        }
    }
}

#[async_trait]
impl Input for Color {
    fn input_type(&self) -> InputType {
        InputType::Color
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }
}

/// A datetime or date picker configured with a flatpickr format.
#[derive(Debug, Clone)]
pub struct DateTime {
    base: InputBase,
    kind: InputType,
}

impl Default for DateTime {
    fn default() -> Self {
        Self::new()
    }
}

impl DateTime {
    /// A datetime picker using `Y-m-d H:i:S`.
    pub fn new() -> Self {
        Self::picker(InputType::DateTime, true, "Y-m-d H:i:S")
    }

    /// A date picker using `Y-m-d`.
    pub fn date() -> Self {
        Self::picker(InputType::Date, false, "Y-m-d")
    }

    fn picker(kind: InputType, enable_time: bool, format: &str) -> Self {
        let mut base = InputBase::new("widgets/inputs/datetime.html");
        base.widget.set("enable_time", enable_time);
        base.widget.set("format", format);
        Self { base, kind }
    }

    /// Replaces the flatpickr format.
    #[must_use]
    pub fn format(mut self, format: &str) -> Self {
        self.base.widget.set("format", format);
        self
    }
}

#[async_trait]
impl Input for DateTime {
    fn input_type(&self) -> InputType {
        self.kind
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }
}

/// A JSON editor.
///
/// The browser submits the document as text; it is parsed on the server.
#[derive(Clone)]
pub struct Json {
    base: InputBase,
    dumper: JsonDumper,
}

impl fmt::Debug for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Json")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl Default for Json {
    fn default() -> Self {
        Self::new()
    }
}

impl Json {
    /// A JSON editor in `code` mode.
    pub fn new() -> Self {
        let mut base = InputBase::new("widgets/inputs/json.html");
        base.widget.set("options", json!({ "mode": "code" }));
        Self {
            base,
            dumper: Arc::new(pretty_json),
        }
    }

    /// Replaces the editor options passed to the browser.
    #[must_use]
    pub fn options(mut self, options: Map<String, Value>) -> Self {
        self.base.widget.set("options", Value::Object(options));
        self
    }

    /// Replaces the serializer used for the stored document.
    #[must_use]
    pub fn dumper(mut self, dumper: JsonDumper) -> Self {
        self.dumper = dumper;
        self
    }
}

#[async_trait]
impl Input for Json {
    fn input_type(&self) -> InputType {
        InputType::Json
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }

    async fn parse(&self, form: &FormData) -> AdminResult<Option<Value>> {
        let Some(raw) = form.get(self.name()) else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(Some(if self.is_nullable() { Value::Null } else { json!({}) }));
        }
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|e| AdminError::Validation(format!("{} is not valid JSON: {e}", self.name())))
    }

    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        let value = if value.is_null() {
            self.default_value()
        } else {
            value
        };
        let document = match value {
            Value::Null => String::new(),
            Value::String(text) => serde_json::from_str::<Value>(text)
                .map_or_else(|_| text.clone(), |parsed| (self.dumper)(&parsed)),
            other => (self.dumper)(other),
        };
        self.base.widget.render_with(
            cx,
            &Value::String(document),
            std::iter::empty::<(&str, Value)>(),
        )
    }
}

// ---------------------------------------------------------------------------
// Choice inputs
// ---------------------------------------------------------------------------

/// A `<select>`, or a foreign-key select over a related model.
#[derive(Debug, Clone)]
pub struct Select {
    base: InputBase,
    kind: InputType,
    options: Arc<dyn OptionsSource>,
}

impl Select {
    /// A select over `options`.
    pub fn new(options: Arc<dyn OptionsSource>) -> Self {
        Self {
            base: InputBase::new("widgets/inputs/select.html"),
            kind: InputType::Select,
            options,
        }
    }

    /// A foreign-key select. `options` lists the related rows as
    /// `(label, primary key)`.
    pub fn foreign_key(options: Arc<dyn OptionsSource>) -> Self {
        Self {
            kind: InputType::ForeignKey,
            ..Self::new(options)
        }
    }
}

#[async_trait]
impl Input for Select {
    fn input_type(&self) -> InputType {
        self.kind
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }

    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        let mut options = self.options.options().await?;
        if self.is_nullable() {
            options.insert(0, (String::new(), Value::String(String::new())));
        }
        let value = if value.is_null() {
            self.default_value()
        } else {
            value
        };
        self.base.widget.render_with(
            cx,
            &Value::String(value_to_string(value)),
            [("options", stringify_options(&options))],
        )
    }
}

/// A `<select multiple>` over the rows of a related model.
///
/// The stored value is the array of selected primary keys.
#[derive(Debug, Clone)]
pub struct ManyToMany {
    base: InputBase,
    options: Arc<dyn OptionsSource>,
}

impl ManyToMany {
    /// A multi-select over `options`.
    pub fn new(options: Arc<dyn OptionsSource>) -> Self {
        Self {
            base: InputBase::new("widgets/inputs/many_to_many.html"),
            options,
        }
    }
}

#[async_trait]
impl Input for ManyToMany {
    fn input_type(&self) -> InputType {
        InputType::ManyToMany
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }

    async fn parse(&self, form: &FormData) -> AdminResult<Option<Value>> {
        let values = form.get_all(self.name());
        if values.is_empty() && !form.contains(self.name()) {
            return Ok(Some(Value::Array(Vec::new())));
        }
        Ok(Some(Value::Array(
            values
                .iter()
                .filter(|v| !v.is_empty())
                .map(|v| Value::String(v.clone()))
                .collect(),
        )))
    }

    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        let selected: Vec<String> = match value {
            Value::Array(items) => items.iter().map(value_to_string).collect(),
            Value::Null => Vec::new(),
            other => vec![value_to_string(other)],
        };
        let options: Vec<Value> = self
            .options
            .options()
            .await?
            .into_iter()
            .map(|(label, value)| {
                let value = value_to_string(&value);
                json!({
                    "label": label,
                    "selected": selected.contains(&value),
                    "value": value,
                })
            })
            .collect();
        self.base
            .widget
            .render_with(cx, value, [("options", options)])
    }
}

/// A `<select>` over enum members, coercing the submitted value to the
/// member type.
#[derive(Debug, Clone)]
pub struct Enum {
    base: InputBase,
    kind: InputType,
    choices: EnumChoices,
}

impl Enum {
    /// A select over `choices`.
    pub fn new(choices: EnumChoices) -> Self {
        Self {
            base: InputBase::new("widgets/inputs/select.html"),
            kind: InputType::Enum,
            choices,
        }
    }

    /// Radio buttons over `choices`.
    pub fn radio(choices: EnumChoices) -> Self {
        Self {
            base: InputBase::new("widgets/inputs/radio.html"),
            kind: InputType::RadioEnum,
            choices,
        }
    }

    /// The member values accepted by this input.
    pub fn choices(&self) -> &EnumChoices {
        &self.choices
    }
}

#[async_trait]
impl Input for Enum {
    fn input_type(&self) -> InputType {
        self.kind
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }

    async fn parse(&self, form: &FormData) -> AdminResult<Option<Value>> {
        let Some(raw) = form.get(self.name()) else {
            return Ok(None);
        };
        if raw.is_empty() && self.is_nullable() {
            return Ok(Some(Value::Null));
        }
        self.choices.coerce(raw).map(Some).ok_or_else(|| {
            let expected = match self.choices.kind() {
                EnumKind::Int => "an integer member",
                EnumKind::Str => "a member",
            };
            AdminError::Validation(format!(
                "'{raw}' is not {expected} of {}",
                self.name()
            ))
        })
    }

    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        let mut options = self.choices.members().to_vec();
        if self.is_nullable() {
            options.insert(0, (String::new(), Value::String(String::new())));
        }
        let value = if value.is_null() {
            self.default_value()
        } else {
            value
        };
        self.base.widget.render_with(
            cx,
            &Value::String(value_to_string(value)),
            [("options", stringify_options(&options))],
        )
    }
}

/// Radio buttons over a fixed option list.
#[derive(Debug, Clone)]
pub struct Radio {
    base: InputBase,
    options: Vec<(String, Value)>,
}

impl Radio {
    /// Radio buttons over `(label, value)` pairs.
    pub fn new<L: Into<String>, V: Into<Value>>(options: impl IntoIterator<Item = (L, V)>) -> Self {
        Self {
            base: InputBase::new("widgets/inputs/radio.html"),
            options: options
                .into_iter()
                .map(|(label, value)| (label.into(), value.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl Input for Radio {
    fn input_type(&self) -> InputType {
        InputType::Radio
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }

    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        let value = if value.is_null() {
            self.default_value()
        } else {
            value
        };
        self.base.widget.render_with(
            cx,
            &Value::String(value_to_string(value)),
            [("options", stringify_options(&self.options))],
        )
    }
}

/// A checkbox switch. A checked box submits `on`.
#[derive(Debug, Clone)]
pub struct Switch {
    base: InputBase,
}

impl Default for Switch {
    fn default() -> Self {
        Self::new()
    }
}

impl Switch {
    /// A switch.
    pub fn new() -> Self {
        Self {
            base: InputBase::new("widgets/inputs/switch.html"),
        }
    }
}

#[async_trait]
impl Input for Switch {
    fn input_type(&self) -> InputType {
        InputType::Switch
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }

    async fn parse(&self, form: &FormData) -> AdminResult<Option<Value>> {
        // Browsers omit unchecked boxes entirely.
        Ok(Some(Value::Bool(form.get(self.name()) == Some("on"))))
    }

    async fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        let value = if value.is_null() {
            self.default_value()
        } else {
            value
        };
        let checked = match value {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => matches!(s.as_str(), "on" | "1" | "true"),
            _ => false,
        };
        self.base
            .widget
            .render_with(cx, &Value::Bool(checked), std::iter::empty::<(&str, Value)>())
    }
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// A file upload stored through a [`FileManager`].
///
/// The parsed value is the location the manager returns. A file input the
/// user left empty keeps the stored value.
#[derive(Clone)]
pub struct File {
    base: InputBase,
    kind: InputType,
    manager: Arc<dyn FileManager>,
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("base", &self.base)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl File {
    /// A file upload.
    pub fn new(manager: Arc<dyn FileManager>) -> Self {
        let mut base = InputBase::new("widgets/inputs/input.html");
        base.widget.set("input_type", "file");
        Self {
            base,
            kind: InputType::File,
            manager,
        }
    }

    /// An image upload with a preview of the current image.
    pub fn image(manager: Arc<dyn FileManager>) -> Self {
        Self {
            base: InputBase::new("widgets/inputs/image.html"),
            kind: InputType::Image,
            manager,
        }
    }
}

#[async_trait]
impl Input for File {
    fn input_type(&self) -> InputType {
        self.kind
    }

    fn base(&self) -> &InputBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut InputBase {
        &mut self.base
    }

    async fn parse(&self, form: &FormData) -> AdminResult<Option<Value>> {
        let Some(file) = form.file(self.name()).filter(|f| !f.filename.is_empty()) else {
            return Ok(None);
        };
        let location = self.manager.upload(file).await?;
        tracing::debug!(field = %self.name(), location = %location, "Stored upload");
        Ok(Some(Value::String(location)))
    }
}

input_builder!(
    Text, Number, TextArea, Editor, Color, DateTime, Json, Select, ManyToMany, Enum,
    Radio, Switch, File,
);
