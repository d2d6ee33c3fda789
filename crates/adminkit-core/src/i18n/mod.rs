//! Internationalization for the admin panel.
//!
//! Translations come from compiled gettext catalogs laid out as
//! `<locale>/LC_MESSAGES/<domain>.mo`. English and Ukrainian catalogs ship
//! with the crate; a translations directory can replace them and an extra
//! directory can be merged over them message by message.
//!
//! The locale is always passed explicitly. Unknown locales degrade to the
//! source string instead of failing.
//!
//! ```
//! use adminkit_core::i18n::{I18nTranslator, Translator};
//!
//! let translator = I18nTranslator::builder().build().unwrap();
//! assert_eq!(translator.gettext("login", None, 1, Some("en")), "Login");
//! assert_eq!(translator.gettext("login", None, 1, Some("it")), "login");
//! ```

pub mod catalog;
pub mod plural;

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

pub use catalog::{Catalog, CatalogError};
pub use plural::PluralRule;

use crate::error::{AdminError, AdminResult};
use crate::settings::AdminSettings;

const BUILTIN_CATALOGS: &[(&str, &[u8])] = &[
    ("en", include_bytes!("../../locales/en/LC_MESSAGES/messages.mo")),
    ("uk", include_bytes!("../../locales/uk/LC_MESSAGES/messages.mo")),
];

/// Looks up translated UI strings.
pub trait Translator: Send + Sync {
    /// Translates `singular`, or `plural` when the count calls for it.
    ///
    /// `locale` of `None` means the default locale. A locale without a
    /// loaded catalog yields `singular`, or `plural` if `n != 1`.
    fn gettext(&self, singular: &str, plural: Option<&str>, n: u64, locale: Option<&str>)
        -> String;

    /// The locales with a loaded catalog.
    fn available_translations(&self) -> BTreeSet<String>;

    /// The locale used when a request does not resolve to one.
    fn default_locale(&self) -> &str;

    /// Re-reads every catalog source.
    fn reload_locales(&self) -> AdminResult<()>;

    /// Translates a singular message for `locale`.
    fn t(&self, msgid: &str, locale: &str) -> String {
        self.gettext(msgid, None, 1, Some(locale))
    }
}

/// A [`Translator`] backed by gettext `.mo` catalogs.
#[derive(Debug)]
pub struct I18nTranslator {
    translations_dir: Option<PathBuf>,
    extra_translations_dir: Option<PathBuf>,
    default_locale: String,
    domain: String,
    catalogs: RwLock<HashMap<String, Catalog>>,
}

impl I18nTranslator {
    /// Starts building a translator over the built-in catalogs.
    pub fn builder() -> I18nTranslatorBuilder {
        I18nTranslatorBuilder::default()
    }

    /// Builds a translator from the i18n section of the settings.
    pub fn from_settings(settings: &AdminSettings) -> AdminResult<Self> {
        let mut builder = Self::builder()
            .default_locale(&settings.default_locale)
            .domain(&settings.locale_domain);
        if let Some(dir) = &settings.locales_dir {
            builder = builder.default_translations(dir);
        }
        if let Some(dir) = &settings.extra_locales_dir {
            builder = builder.extra_translations(dir);
        }
        builder.build()
    }

    /// Returns `true` if a catalog is loaded for `locale`.
    pub fn has_locale(&self, locale: &str) -> bool {
        self.catalogs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(locale)
    }

    fn load_all(&self) -> AdminResult<HashMap<String, Catalog>> {
        let mut catalogs = match &self.translations_dir {
            Some(dir) => load_directory(dir, &self.domain)?,
            None => builtin_catalogs()?,
        };
        if let Some(dir) = &self.extra_translations_dir {
            for (locale, extra) in load_directory(dir, &self.domain)? {
                catalogs.entry(locale).or_default().merge(extra);
            }
        }
        tracing::debug!(
            locales = ?catalogs.keys().collect::<Vec<_>>(),
            "Loaded translation catalogs"
        );
        Ok(catalogs)
    }
}

impl Translator for I18nTranslator {
    fn gettext(
        &self,
        singular: &str,
        plural: Option<&str>,
        n: u64,
        locale: Option<&str>,
    ) -> String {
        let locale = locale.unwrap_or(&self.default_locale);
        let catalogs = self.catalogs.read().unwrap_or_else(PoisonError::into_inner);
        let translated = catalogs.get(locale).and_then(|catalog| match plural {
            Some(_) => catalog.ngettext(singular, n),
            None => catalog.gettext(singular),
        });
        match (translated, plural) {
            (Some(text), _) => text.to_string(),
            (None, Some(plural)) if n != 1 => plural.to_string(),
            (None, _) => singular.to_string(),
        }
    }

    fn available_translations(&self) -> BTreeSet<String> {
        self.catalogs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    fn default_locale(&self) -> &str {
        &self.default_locale
    }

    fn reload_locales(&self) -> AdminResult<()> {
        let fresh = self.load_all()?;
        *self.catalogs.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        tracing::info!("Reloaded translation catalogs");
        Ok(())
    }
}

/// Builder for [`I18nTranslator`].
#[derive(Debug, Clone)]
pub struct I18nTranslatorBuilder {
    translations_dir: Option<PathBuf>,
    extra_translations_dir: Option<PathBuf>,
    default_locale: String,
    domain: String,
}

impl Default for I18nTranslatorBuilder {
    fn default() -> Self {
        Self {
            translations_dir: None,
            extra_translations_dir: None,
            default_locale: "en".to_string(),
            domain: "messages".to_string(),
        }
    }
}

impl I18nTranslatorBuilder {
    /// Replaces the built-in catalogs with the ones found under `dir`.
    #[must_use]
    pub fn default_translations(mut self, dir: impl Into<PathBuf>) -> Self {
        self.translations_dir = Some(dir.into());
        self
    }

    /// Merges the catalogs found under `dir` over the default ones.
    #[must_use]
    pub fn extra_translations(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extra_translations_dir = Some(dir.into());
        self
    }

    /// Sets the default locale.
    #[must_use]
    pub fn default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    /// Sets the catalog file stem (`messages` by default).
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Loads every catalog and returns the translator.
    pub fn build(self) -> AdminResult<I18nTranslator> {
        let translator = I18nTranslator {
            translations_dir: self.translations_dir,
            extra_translations_dir: self.extra_translations_dir,
            default_locale: self.default_locale,
            domain: self.domain,
            catalogs: RwLock::new(HashMap::new()),
        };
        translator.reload_locales()?;
        Ok(translator)
    }
}

fn builtin_catalogs() -> AdminResult<HashMap<String, Catalog>> {
    BUILTIN_CATALOGS
        .iter()
        .map(|(locale, data)| Ok(((*locale).to_string(), Catalog::from_mo_bytes(data)?)))
        .collect()
}

/// Loads `<dir>/<locale>/LC_MESSAGES/<domain>.mo` for every locale directory.
fn load_directory(dir: &Path, domain: &str) -> AdminResult<HashMap<String, Catalog>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        AdminError::Configuration(format!(
            "Cannot read translations directory '{}': {e}",
            dir.display()
        ))
    })?;

    let mut catalogs = HashMap::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let locale = entry.file_name().to_string_lossy().into_owned();
        let messages_dir = entry.path().join("LC_MESSAGES");
        let mo = messages_dir.join(format!("{domain}.mo"));
        let po = messages_dir.join(format!("{domain}.po"));

        if mo.is_file() {
            let data = std::fs::read(&mo)?;
            catalogs.insert(locale, Catalog::from_mo_bytes(&data)?);
        } else if po.is_file() {
            return Err(AdminError::Configuration(format!(
                "Translations for '{locale}' are not compiled: found '{}' without '{}'",
                po.display(),
                mo.display()
            )));
        } else {
            tracing::debug!(locale = %locale, "Skipping locale directory without a catalog");
        }
    }
    Ok(catalogs)
}
