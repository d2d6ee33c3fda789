//! The widget core shared by displays, inputs, and filters.

use adminkit_core::AdminResult;
use adminkit_template::{Context, Templates};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

/// Everything a widget needs to render during one request.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// The compiled admin templates.
    pub templates: &'a Templates,
    /// The locale resolved for the request.
    pub locale: &'a str,
}

impl<'a> RenderContext<'a> {
    /// Bundles templates and a locale.
    pub fn new(templates: &'a Templates, locale: &'a str) -> Self {
        Self { templates, locale }
    }

    /// Translates `msgid` into the request locale.
    pub fn t(&self, msgid: &str) -> String {
        self.templates.gettext(msgid, self.locale)
    }
}

/// A template name plus the context it renders with.
///
/// A widget with an empty template renders its value as a plain string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Widget {
    template: String,
    context: Map<String, Value>,
}

impl Widget {
    /// A widget rendering `template`.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            context: Map::new(),
        }
    }

    /// A widget without a template.
    pub fn raw() -> Self {
        Self::default()
    }

    /// The template name, empty for raw widgets.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Replaces the template.
    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
    }

    /// The context the template renders with.
    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// Sets a context entry.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.context.insert(key.to_string(), value.into());
    }

    /// Sets a context entry and returns the widget.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// A context entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// A context entry as a string, empty when missing or not a string.
    pub fn get_str(&self, key: &str) -> &str {
        self.context.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    /// A context entry as a boolean, `false` when missing.
    pub fn get_bool(&self, key: &str) -> bool {
        self.context
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or_default()
    }

    /// Renders `value` with the widget's own context.
    ///
    /// A null value renders as an empty string. A raw widget renders the
    /// value as text without escaping.
    pub fn render(&self, cx: &RenderContext<'_>, value: &Value) -> AdminResult<String> {
        if value.is_null() {
            return Ok(String::new());
        }
        if self.template.is_empty() {
            return Ok(value_to_string(value));
        }
        self.render_with(cx, value, std::iter::empty::<(&str, Value)>())
    }

    /// Renders `value` with the widget's context plus `extra` entries.
    ///
    /// Unlike [`render`](Self::render), null values reach the template.
    pub fn render_with<'k, I, V>(
        &self,
        cx: &RenderContext<'_>,
        value: &Value,
        extra: I,
    ) -> AdminResult<String>
    where
        I: IntoIterator<Item = (&'k str, V)>,
        V: Serialize,
    {
        let mut context = Context::new();
        for (key, entry) in &self.context {
            context.insert(key.as_str(), entry);
        }
        for (key, entry) in extra {
            context.insert(key, &entry);
        }
        context.insert("value", value);
        context.insert("current_locale", cx.locale);
        cx.templates.render(&self.template, &context)
    }
}

/// Formats a value as plain text.
///
/// Strings lose their quotes, null becomes empty, and everything else uses
/// its JSON form.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parses the datetime layouts databases and forms produce.
///
/// Accepts `2024-01-31 10:00:00`, `2024-01-31T10:00:00` (with optional
/// fractional seconds), RFC 3339, and a bare date at midnight.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    const LAYOUTS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    let text = text.trim();
    for layout in LAYOUTS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(parsed);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_local());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Turns a field name into a human label, `created_at` into `Created At`.
pub fn title_case(name: &str) -> String {
    name.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stringifies `(label, value)` options for templates that compare them with
/// the current value as text.
pub fn stringify_options(options: &[(String, Value)]) -> Vec<(String, String)> {
    options
        .iter()
        .map(|(label, value)| (label.clone(), value_to_string(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use adminkit_core::i18n::I18nTranslator;
    use serde_json::json;

    use super::*;

    fn templates() -> Templates {
        Templates::new(Arc::new(I18nTranslator::builder().build().unwrap())).unwrap()
    }

    #[test]
    fn test_raw_widget_renders_text() {
        let t = templates();
        let cx = RenderContext::new(&t, "en");
        assert_eq!(Widget::raw().render(&cx, &json!("a<b")).unwrap(), "a<b");
        assert_eq!(Widget::raw().render(&cx, &json!(42)).unwrap(), "42");
        assert_eq!(Widget::raw().render(&cx, &Value::Null).unwrap(), "");
    }

    #[test]
    fn test_template_widget_escapes_value() {
        let t = templates();
        let cx = RenderContext::new(&t, "en");
        let html = Widget::new("widgets/displays/json.html")
            .render(&cx, &json!("<b>"))
            .unwrap();
        assert!(html.contains("&lt;b&gt;"));
    }

    #[test]
    fn test_context_accessors() {
        let widget = Widget::new("x.html").with("name", "email").with("null", true);
        assert_eq!(widget.get_str("name"), "email");
        assert!(widget.get_bool("null"));
        assert!(!widget.get_bool("disabled"));
        assert_eq!(widget.get_str("missing"), "");
    }

    #[test]
    fn test_parse_datetime_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-01-31 10:00:00"), Some(expected));
        assert_eq!(parse_datetime("2024-01-31T10:00:00.000"), Some(expected));
        assert_eq!(parse_datetime("2024-01-31T10:00:00+02:00"), Some(expected));
        assert_eq!(
            parse_datetime("2024-01-31"),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_datetime("yesterday"), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("created_at"), "Created At");
        assert_eq!(title_case("id"), "Id");
        assert_eq!(title_case("__x__"), "X");
    }

    #[test]
    fn test_stringify_options() {
        let options = vec![("One".to_string(), json!(1)), ("Off".to_string(), json!("off"))];
        assert_eq!(
            stringify_options(&options),
            vec![
                ("One".to_string(), "1".to_string()),
                ("Off".to_string(), "off".to_string())
            ]
        );
    }
}
