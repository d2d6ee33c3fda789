//! The template engine used by every admin page and widget.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use adminkit_core::i18n::Translator;
use adminkit_core::{AdminError, AdminResult};
use tera::{Context, Tera};

use crate::functions::Translate;
use crate::loaders::{FileSystemLoader, BUILTIN_TEMPLATES};

/// Compiled admin templates plus the translator they render with.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use adminkit_core::i18n::I18nTranslator;
/// use adminkit_template::{Context, Templates};
///
/// let translator = Arc::new(I18nTranslator::builder().build().unwrap());
/// let templates = Templates::new(translator).unwrap();
///
/// let mut context = Context::new();
/// context.insert("value", &true);
/// context.insert("current_locale", "en");
/// let html = templates.render("widgets/displays/boolean.html", &context).unwrap();
/// assert!(html.contains("True"));
/// ```
pub struct Templates {
    tera: Tera,
    translator: Arc<dyn Translator>,
}

impl fmt::Debug for Templates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Templates")
            .field("templates", &self.tera.get_template_names().count())
            .finish_non_exhaustive()
    }
}

impl Templates {
    /// Compiles the built-in templates.
    pub fn new(translator: Arc<dyn Translator>) -> AdminResult<Self> {
        Self::with_dirs(translator, Vec::new())
    }

    /// Compiles the built-in templates, then the templates found in `dirs`.
    ///
    /// A template in `dirs` replaces the built-in one with the same name.
    pub fn with_dirs(translator: Arc<dyn Translator>, dirs: Vec<PathBuf>) -> AdminResult<Self> {
        let mut sources: BTreeMap<String, String> = BUILTIN_TEMPLATES
            .iter()
            .map(|(name, source)| ((*name).to_string(), (*source).to_string()))
            .collect();
        for (name, source) in FileSystemLoader::new(dirs).load_all()? {
            tracing::debug!(template = %name, "Using template from folder");
            sources.insert(name, source);
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources)
            .map_err(|e| AdminError::Template(describe(&e)))?;
        tera.set_escape_fn(escape_html);
        tera.register_function("t", Translate::new(Arc::clone(&translator)));

        Ok(Self { tera, translator })
    }

    /// Returns `true` if a template with this name exists.
    pub fn has(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Renders a template.
    pub fn render(&self, name: &str, context: &Context) -> AdminResult<String> {
        self.tera
            .render(name, context)
            .map_err(|e| AdminError::Template(describe(&e)))
    }

    /// Renders the first template of `names` that exists.
    pub fn render_first(&self, names: &[String], context: &Context) -> AdminResult<String> {
        let name = names
            .iter()
            .find(|name| self.has(name))
            .ok_or_else(|| AdminError::Template(format!("None of {names:?} exist")))?;
        self.render(name, context)
    }

    /// Renders an inline template string.
    pub fn render_str(&mut self, source: &str, context: &Context) -> AdminResult<String> {
        self.tera
            .render_str(source, context)
            .map_err(|e| AdminError::Template(describe(&e)))
    }

    /// The translator shared with the `t` function.
    pub fn translator(&self) -> &Arc<dyn Translator> {
        &self.translator
    }

    /// Translates a singular message.
    pub fn gettext(&self, msgid: &str, locale: &str) -> String {
        self.translator.t(msgid, locale)
    }
}

/// HTML-escapes template output, leaving `/` alone so URLs stay readable.
fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#x27;"),
            _ => output.push(c),
        }
    }
    output
}

/// Flattens a Tera error and its causes into one line.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use adminkit_core::i18n::I18nTranslator;

    use super::*;

    fn templates() -> Templates {
        Templates::new(Arc::new(I18nTranslator::builder().build().unwrap())).unwrap()
    }

    #[test]
    fn test_builtins_compile() {
        let t = templates();
        assert!(t.has("layout.html"));
        assert!(t.has("widgets/inputs/input.html"));
        assert!(!t.has("user/list.html"));
    }

    #[test]
    fn test_render_unknown_template() {
        let err = templates().render("nope.html", &Context::new()).unwrap_err();
        assert!(matches!(err, AdminError::Template(_)));
    }

    #[test]
    fn test_render_first_falls_back() {
        let mut context = Context::new();
        context.insert("value", "x");
        context.insert("current_locale", "en");
        let html = templates()
            .render_first(
                &[
                    "user/missing.html".to_string(),
                    "widgets/displays/json.html".to_string(),
                ],
                &context,
            )
            .unwrap();
        assert!(html.contains('x'));
    }

    #[test]
    fn test_escape_keeps_slashes() {
        assert_eq!(
            escape_html("<a href='/x?a=1&b=2'>"),
            "&lt;a href=&#x27;/x?a=1&amp;b=2&#x27;&gt;"
        );
    }

    #[test]
    fn test_render_str_with_translation() {
        let mut t = templates();
        let mut context = Context::new();
        context.insert("current_locale", "uk");
        let text = t
            .render_str("{{ t(key=\"login\", locale=current_locale) }}", &context)
            .unwrap();
        assert_eq!(text, t.gettext("login", "uk"));
        assert_ne!(text, "login");
    }
}
