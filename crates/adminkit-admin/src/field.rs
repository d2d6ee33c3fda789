//! Fields: a model attribute paired with a display and an input.

use std::fmt;
use std::sync::Arc;

use adminkit_core::AdminResult;
use adminkit_widgets::displays::{self, Display, DisplayType};
use adminkit_widgets::inputs::{self, Input, InputType};
use adminkit_widgets::widget::title_case;
use adminkit_widgets::RenderContext;
use async_trait::async_trait;
use serde_json::Value;

use crate::backend::Row;

/// Derives a field value from a whole row.
#[async_trait]
pub trait ComputedValue: Send + Sync {
    /// The value shown for `row`.
    async fn get_value(&self, cx: &RenderContext<'_>, row: &Row) -> AdminResult<Value>;
}

#[async_trait]
impl<F> ComputedValue for F
where
    F: Fn(&Row) -> Value + Send + Sync,
{
    async fn get_value(&self, _cx: &RenderContext<'_>, row: &Row) -> AdminResult<Value> {
        Ok(self(row))
    }
}

/// A model attribute as the admin shows and edits it.
///
/// The input is bound to the field name and label, so it always renders
/// and parses the right form key.
///
/// ```
/// use adminkit_admin::field::Field;
/// use adminkit_widgets::displays;
/// use adminkit_widgets::inputs::{self, Input};
///
/// let field = Field::new("is_active")
///     .display(displays::Boolean::new())
///     .input(inputs::Switch::new());
/// assert_eq!(field.label_text(), "Is Active");
/// assert_eq!(field.input_widget().name(), "is_active");
/// ```
pub struct Field {
    name: String,
    label: String,
    display: Box<dyn Display>,
    input: Box<dyn Input>,
    computed: Option<Arc<dyn ComputedValue>>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("display", &self.display.display_type())
            .field("input", &self.input.input_type())
            .field("computed", &self.computed.is_some())
            .finish()
    }
}

impl Field {
    /// A field with a raw display and a text input, labelled from its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let label = title_case(&name);
        let mut input: Box<dyn Input> = Box::new(inputs::Text::new());
        input.bind(&name, &label);
        Self {
            name,
            label,
            display: Box::new(displays::Raw::new()),
            input,
            computed: None,
        }
    }

    /// A field whose value is derived from the row instead of read from it.
    ///
    /// Computed fields are display-only.
    pub fn computed(name: impl Into<String>, getter: impl ComputedValue + 'static) -> Self {
        let mut field = Self::new(name).input(inputs::DisplayOnly::new());
        field.computed = Some(Arc::new(getter));
        field
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self.input.bind(&self.name, &self.label);
        self
    }

    /// Sets the display.
    #[must_use]
    pub fn display(mut self, display: impl Display + 'static) -> Self {
        self.display = Box::new(display);
        self
    }

    /// Sets the input.
    #[must_use]
    pub fn input(self, input: impl Input + 'static) -> Self {
        self.boxed_input(Box::new(input))
    }

    /// Sets an already boxed input.
    #[must_use]
    pub fn boxed_input(mut self, mut input: Box<dyn Input>) -> Self {
        input.bind(&self.name, &self.label);
        self.input = input;
        self
    }

    /// Sets an already boxed display.
    #[must_use]
    pub fn boxed_display(mut self, display: Box<dyn Display>) -> Self {
        self.display = display;
        self
    }

    /// The attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column header and form label.
    pub fn label_text(&self) -> &str {
        &self.label
    }

    /// The display.
    pub fn display_widget(&self) -> &dyn Display {
        self.display.as_ref()
    }

    /// The input.
    pub fn input_widget(&self) -> &dyn Input {
        self.input.as_ref()
    }

    /// Returns `true` for computed fields.
    pub fn is_computed(&self) -> bool {
        self.computed.is_some()
    }

    /// Returns `true` if the field only appears in forms.
    pub fn is_input_only(&self) -> bool {
        self.display.display_type() == DisplayType::InputOnly
    }

    /// Returns `true` if the field cannot be edited.
    pub fn is_display_only(&self) -> bool {
        self.input.input_type() == InputType::DisplayOnly
    }

    /// Reads the field value of `row`.
    pub async fn value(&self, cx: &RenderContext<'_>, row: &Row) -> AdminResult<Value> {
        match &self.computed {
            Some(getter) => getter.get_value(cx, row).await,
            None => Ok(row.get(&self.name).cloned().unwrap_or(Value::Null)),
        }
    }

    /// Renders the field value of `row` through the display.
    pub async fn render(&self, cx: &RenderContext<'_>, row: &Row) -> AdminResult<String> {
        let value = self.value(cx, row).await?;
        self.display.render(cx, &value).await
    }
}

/// A field declared on a resource, by name or fully specified.
#[derive(Debug)]
pub enum FieldDecl {
    /// Scaffold the field from column metadata.
    Name(String),
    /// Use this field as is.
    Field(Field),
}

impl FieldDecl {
    /// The declared attribute name.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Field(field) => field.name(),
        }
    }
}

impl From<&str> for FieldDecl {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for FieldDecl {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Field> for FieldDecl {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}
