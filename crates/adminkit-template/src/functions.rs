//! Tera functions registered on every [`Templates`](crate::Templates) instance.

use std::collections::HashMap;
use std::sync::Arc;

use adminkit_core::i18n::Translator;
use tera::{Function, Value};

/// The `t` template function.
///
/// Arguments:
///
/// - `key` (required) the message id
/// - `locale` the locale; the translator's default when missing or null
/// - `plural` and `n` for plural lookups
///
/// Any other argument fills a `%(name)s` placeholder in the translated text.
pub struct Translate {
    translator: Arc<dyn Translator>,
}

impl Translate {
    /// Wraps a translator.
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }
}

const RESERVED: [&str; 4] = ["key", "locale", "plural", "n"];

impl Function for Translate {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let key = args
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("t() requires a string `key` argument"))?;
        let locale = args.get("locale").and_then(Value::as_str);
        let plural = args.get("plural").and_then(Value::as_str);
        let n = args.get("n").and_then(Value::as_u64).unwrap_or(1);

        let mut text = self.translator.gettext(key, plural, n, locale);
        for (name, value) in args.iter().filter(|(k, _)| !RESERVED.contains(&k.as_str())) {
            let replacement = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            text = text.replace(&format!("%({name})s"), &replacement);
        }
        Ok(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use adminkit_core::i18n::I18nTranslator;

    use super::*;

    fn translate() -> Translate {
        Translate::new(Arc::new(I18nTranslator::builder().build().unwrap()))
    }

    fn args(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_translate_key() {
        let value = translate()
            .call(&args(&[("key", "login".into()), ("locale", "en".into())]))
            .unwrap();
        assert_eq!(value, Value::String("Login".into()));
    }

    #[test]
    fn test_null_locale_uses_default() {
        let value = translate()
            .call(&args(&[("key", "login".into()), ("locale", Value::Null)]))
            .unwrap();
        assert_eq!(value, Value::String("Login".into()));
    }

    #[test]
    fn test_plural_with_placeholder() {
        let value = translate()
            .call(&args(&[
                ("key", "%(count)s entry".into()),
                ("plural", "%(count)s entries".into()),
                ("n", 3.into()),
                ("count", 3.into()),
                ("locale", "en".into()),
            ]))
            .unwrap();
        assert_eq!(value, Value::String("3 entries".into()));
    }

    #[test]
    fn test_missing_key_is_an_error() {
        assert!(translate().call(&args(&[("locale", "en".into())])).is_err());
    }
}
