//! Request locale resolution.
//!
//! The locale is looked up in the `language` query parameter, then the
//! `language` cookie, then the first `Accept-Language` entry. The result is
//! passed explicitly down the render chain.

use adminkit_core::i18n::Translator;
use adminkit_core::{AdminError, AdminResult};
use http::header::ACCEPT_LANGUAGE;
use http::request::Parts;
use http::HeaderMap;

use crate::cookies::cookie_value;

/// Name of the query parameter and cookie carrying the locale.
pub const LANGUAGE_KEY: &str = "language";

/// Extracts the raw locale from the query string and headers.
///
/// `Accept-Language: uk-UA,uk;q=0.9` yields `uk_UA`.
pub fn get_locale_from_request(query: Option<&str>, headers: &HeaderMap) -> AdminResult<String> {
    let from_query = query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(key, _)| key == LANGUAGE_KEY)
            .map(|(_, value)| value.into_owned())
    });
    if let Some(locale) = from_query.filter(|l| !l.is_empty()) {
        return Ok(locale);
    }

    if let Some(locale) = cookie_value(headers, LANGUAGE_KEY).filter(|l| !l.is_empty()) {
        return Ok(locale);
    }

    headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|entry| entry.split(';').next())
        .map(|tag| tag.trim().replace('-', "_"))
        .filter(|tag| !tag.is_empty() && tag != "*")
        .ok_or(AdminError::UnableToExtractLocale)
}

/// How the admin picks the locale of a request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LocaleStrategy {
    /// Resolve from the request, falling back to the translator's default.
    #[default]
    FromRequest,
    /// Always use this locale.
    Const(String),
}

impl LocaleStrategy {
    /// Resolves the locale for a request.
    ///
    /// A requested locale is reduced to its language part (`uk_UA` to `uk`).
    /// If no catalog is loaded for that language the default locale is used.
    pub fn resolve(&self, parts: &Parts, translator: &dyn Translator) -> String {
        match self {
            Self::Const(locale) => locale.clone(),
            Self::FromRequest => {
                match get_locale_from_request(parts.uri.query(), &parts.headers) {
                    Ok(requested) => {
                        let language = requested.split('_').next().unwrap_or_default();
                        if translator.available_translations().contains(language) {
                            language.to_string()
                        } else {
                            tracing::debug!(requested = %requested, "No catalog for requested locale");
                            translator.default_locale().to_string()
                        }
                    }
                    Err(AdminError::UnableToExtractLocale) => {
                        translator.default_locale().to_string()
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Locale resolution failed");
                        translator.default_locale().to_string()
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use http::header::COOKIE;
    use http::{HeaderValue, Request};

    use super::*;

    struct FixedTranslator;

    impl Translator for FixedTranslator {
        fn gettext(&self, singular: &str, _: Option<&str>, _: u64, _: Option<&str>) -> String {
            singular.to_string()
        }

        fn available_translations(&self) -> BTreeSet<String> {
            ["en", "uk"].into_iter().map(String::from).collect()
        }

        fn default_locale(&self) -> &str {
            "en"
        }

        fn reload_locales(&self) -> AdminResult<()> {
            Ok(())
        }
    }

    fn parts(uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_query_wins_over_cookie_and_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("language=de"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("fr-FR"));
        assert_eq!(
            get_locale_from_request(Some("language=uk&x=1"), &headers).unwrap(),
            "uk"
        );
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("language=de"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("fr-FR"));
        assert_eq!(get_locale_from_request(None, &headers).unwrap(), "de");
    }

    #[test]
    fn test_accept_language_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("uk-UA;q=1.0, en;q=0.5"),
        );
        assert_eq!(get_locale_from_request(None, &headers).unwrap(), "uk_UA");
    }

    #[test]
    fn test_nothing_to_extract() {
        let result = get_locale_from_request(Some("language="), &HeaderMap::new());
        assert!(matches!(result, Err(AdminError::UnableToExtractLocale)));
    }

    #[test]
    fn test_strategy_reduces_to_loaded_language() {
        let p = parts("/admin?language=uk_UA", &[]);
        assert_eq!(LocaleStrategy::FromRequest.resolve(&p, &FixedTranslator), "uk");
    }

    #[test]
    fn test_strategy_falls_back_to_default() {
        let unknown = parts("/admin", &[("accept-language", "it-IT")]);
        assert_eq!(
            LocaleStrategy::FromRequest.resolve(&unknown, &FixedTranslator),
            "en"
        );
        let bare = parts("/admin", &[]);
        assert_eq!(LocaleStrategy::FromRequest.resolve(&bare, &FixedTranslator), "en");
    }

    #[test]
    fn test_const_strategy() {
        let p = parts("/admin?language=en", &[]);
        assert_eq!(
            LocaleStrategy::Const("uk".to_string()).resolve(&p, &FixedTranslator),
            "uk"
        );
    }
}
