//! Compiled gettext catalogs.
//!
//! A [`Catalog`] holds the translations of one locale, decoded from a GNU
//! `.mo` file. Plural entries keep every translated form and the catalog's
//! [`PluralRule`] picks among them. Context translations are stored under
//! `"context\x04msgid"` keys, the way `msgfmt` writes them.
//!
//! ## Binary Layout
//!
//! | Offset | Content |
//! |---|---|
//! | 0 | magic `0x950412de` (byte order of the file) |
//! | 4 | revision |
//! | 8 | number of strings `N` |
//! | 12 | offset of the original strings table |
//! | 16 | offset of the translated strings table |
//!
//! Each table holds `N` pairs of `(length, offset)`.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::plural::PluralRule;
use crate::error::AdminError;

const MAGIC: u32 = 0x9504_12de;
const CONTEXT_SEPARATOR: char = '\x04';

/// A catalog that could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The file does not start with the `.mo` magic number.
    #[error("not a gettext catalog (bad magic number)")]
    BadMagic,
    /// A table entry points outside the file.
    #[error("catalog is truncated at offset {0}")]
    Truncated(usize),
    /// A string is not valid UTF-8.
    #[error("catalog string at offset {0} is not valid UTF-8")]
    InvalidUtf8(usize),
    /// The `Plural-Forms` header could not be parsed.
    #[error("{0}")]
    PluralForms(String),
}

impl From<CatalogError> for AdminError {
    fn from(err: CatalogError) -> Self {
        Self::Configuration(format!("Invalid translation catalog: {err}"))
    }
}

/// Translations for one locale.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<String, Vec<String>>,
    plural: PluralRule,
}

impl Catalog {
    /// Decodes a compiled `.mo` file.
    pub fn from_mo_bytes(data: &[u8]) -> Result<Self, CatalogError> {
        let reader = MoReader::new(data)?;
        let count = reader.word(8)? as usize;
        let originals = reader.word(12)? as usize;
        let translations = reader.word(16)? as usize;

        // Each entry takes at least 8 bytes, so the file bounds the capacity.
        let mut messages = HashMap::with_capacity(count.min(data.len() / 8));
        for i in 0..count {
            let original = reader.string_at(originals + i * 8)?;
            let translated = reader.string_at(translations + i * 8)?;
            // Plural entries are "singular\0plural" mapped to "form0\0form1...".
            let key = original.split('\0').next().unwrap_or_default().to_string();
            let forms: Vec<String> = translated.split('\0').map(str::to_string).collect();
            messages.insert(key, forms);
        }

        let plural = messages
            .get("")
            .and_then(|header| header.first())
            .and_then(|header| plural_expression(header))
            .map(PluralRule::parse)
            .transpose()
            .map_err(|e| CatalogError::PluralForms(e.to_string()))?
            .unwrap_or_default();

        Ok(Self { messages, plural })
    }

    /// Returns the number of translated messages, the header excluded.
    pub fn len(&self) -> usize {
        self.messages.keys().filter(|k| !k.is_empty()).count()
    }

    /// Returns `true` if the catalog has no translated messages.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a singular message.
    pub fn gettext(&self, msgid: &str) -> Option<&str> {
        self.messages
            .get(msgid)
            .and_then(|forms| forms.first())
            .filter(|s| !s.is_empty())
            .map(String::as_str)
    }

    /// Looks up the form of `msgid` selected by the plural rule for `n`.
    pub fn ngettext(&self, msgid: &str, n: u64) -> Option<&str> {
        let forms = self.messages.get(msgid)?;
        let index = self.plural.index(n).min(forms.len().saturating_sub(1));
        forms
            .get(index)
            .filter(|s| !s.is_empty())
            .map(String::as_str)
    }

    /// Looks up a message translated within a context.
    pub fn pgettext(&self, context: &str, msgid: &str) -> Option<&str> {
        self.gettext(&format!("{context}{CONTEXT_SEPARATOR}{msgid}"))
    }

    /// Copies every entry of `other` over this catalog.
    ///
    /// The plural rule is taken from `other` when it carries a header.
    pub fn merge(&mut self, other: Self) {
        if other.messages.contains_key("") {
            self.plural = other.plural;
        }
        self.messages.extend(other.messages);
    }
}

/// Extracts the `plural=` expression from a catalog header.
fn plural_expression(header: &str) -> Option<&str> {
    static PLURAL_FORMS: OnceLock<Option<Regex>> = OnceLock::new();
    let re = PLURAL_FORMS
        .get_or_init(|| Regex::new(r"(?m)^Plural-Forms:.*?plural\s*=\s*([^;\n]+)").ok())
        .as_ref()?;
    re.captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

struct MoReader<'a> {
    data: &'a [u8],
    big_endian: bool,
}

impl<'a> MoReader<'a> {
    fn new(data: &'a [u8]) -> Result<Self, CatalogError> {
        let head: [u8; 4] = data
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or(CatalogError::BadMagic)?;
        if u32::from_le_bytes(head) == MAGIC {
            Ok(Self {
                data,
                big_endian: false,
            })
        } else if u32::from_be_bytes(head) == MAGIC {
            Ok(Self {
                data,
                big_endian: true,
            })
        } else {
            Err(CatalogError::BadMagic)
        }
    }

    fn word(&self, offset: usize) -> Result<u32, CatalogError> {
        let bytes: [u8; 4] = self
            .data
            .get(offset..offset + 4)
            .and_then(|b| b.try_into().ok())
            .ok_or(CatalogError::Truncated(offset))?;
        Ok(if self.big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    }

    /// Reads the string described by the `(length, offset)` pair at `entry`.
    fn string_at(&self, entry: usize) -> Result<&'a str, CatalogError> {
        let len = self.word(entry)? as usize;
        let start = self.word(entry + 4)? as usize;
        let bytes = self
            .data
            .get(start..start + len)
            .ok_or(CatalogError::Truncated(start))?;
        std::str::from_utf8(bytes).map_err(|_| CatalogError::InvalidUtf8(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILTIN_UK: &[u8] = include_bytes!("../../locales/uk/LC_MESSAGES/messages.mo");
    const BUILTIN_EN: &[u8] = include_bytes!("../../locales/en/LC_MESSAGES/messages.mo");

    #[test]
    fn test_builtin_catalogs_decode() {
        let uk = Catalog::from_mo_bytes(BUILTIN_UK).unwrap();
        let en = Catalog::from_mo_bytes(BUILTIN_EN).unwrap();
        assert!(!uk.is_empty());
        assert!(!en.is_empty());
        assert_eq!(en.gettext("login"), Some("Login"));
    }

    #[test]
    fn test_ukrainian_plural_forms() {
        let uk = Catalog::from_mo_bytes(BUILTIN_UK).unwrap();
        let one = uk.ngettext("%(count)s entry", 1).unwrap();
        let few = uk.ngettext("%(count)s entry", 3).unwrap();
        let many = uk.ngettext("%(count)s entry", 5).unwrap();
        assert_ne!(one, few);
        assert_ne!(few, many);
    }

    #[test]
    fn test_missing_message() {
        let en = Catalog::from_mo_bytes(BUILTIN_EN).unwrap();
        assert_eq!(en.gettext("no such message"), None);
        assert_eq!(en.ngettext("no such message", 2), None);
        assert_eq!(en.pgettext("menu", "login"), None);
    }

    #[test]
    fn test_bad_magic() {
        assert_eq!(
            Catalog::from_mo_bytes(b"not a catalog at all").unwrap_err(),
            CatalogError::BadMagic
        );
        assert_eq!(
            Catalog::from_mo_bytes(b"ab").unwrap_err(),
            CatalogError::BadMagic
        );
    }

    #[test]
    fn test_truncated() {
        let mut data = MAGIC.to_le_bytes().to_vec();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        assert!(matches!(
            Catalog::from_mo_bytes(&data),
            Err(CatalogError::Truncated(_))
        ));
    }

    #[test]
    fn test_huge_entry_count_on_tiny_file() {
        let mut data = MAGIC.to_le_bytes().to_vec();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        data.extend_from_slice(&20u32.to_le_bytes());
        data.extend_from_slice(&20u32.to_le_bytes());
        assert!(matches!(
            Catalog::from_mo_bytes(&data),
            Err(CatalogError::Truncated(_))
        ));
    }

    #[test]
    fn test_merge_overrides_entries() {
        let mut en = Catalog::from_mo_bytes(BUILTIN_EN).unwrap();
        let uk = Catalog::from_mo_bytes(BUILTIN_UK).unwrap();
        let uk_login = uk.gettext("login").unwrap().to_string();
        en.merge(uk);
        assert_eq!(en.gettext("login"), Some(uk_login.as_str()));
    }

    #[test]
    fn test_plural_expression_extraction() {
        let header = "Content-Type: text/plain; charset=UTF-8\nPlural-Forms: nplurals=2; plural=(n != 1);\n";
        assert_eq!(plural_expression(header), Some("(n != 1)"));
        assert_eq!(plural_expression("Language: en\n"), None);
    }

    #[test]
    fn test_catalog_error_into_admin_error() {
        let err: AdminError = CatalogError::BadMagic.into();
        assert!(matches!(err, AdminError::Configuration(_)));
    }
}
