//! Integration tests for catalog loading and lookup.

use std::path::Path;

use adminkit_core::i18n::{I18nTranslator, Translator};
use adminkit_core::AdminError;

/// Encodes `(msgid, msgstr)` pairs as a little-endian `.mo` file.
///
/// Plural entries use `"singular\0plural"` ids and `"form0\0form1"` strings.
fn encode_mo(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut entries: Vec<(&str, &str)> = entries.to_vec();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let count = entries.len();
    let originals_offset = 28;
    let translations_offset = originals_offset + count * 8;
    let mut strings_offset = translations_offset + count * 8;

    let mut tables = Vec::new();
    let mut strings = Vec::new();
    let mut translated_table = Vec::new();

    for (id, _) in &entries {
        tables.push((id.len(), strings_offset));
        strings.extend_from_slice(id.as_bytes());
        strings.push(0);
        strings_offset += id.len() + 1;
    }
    for (_, text) in &entries {
        translated_table.push((text.len(), strings_offset));
        strings.extend_from_slice(text.as_bytes());
        strings.push(0);
        strings_offset += text.len() + 1;
    }

    let word = |v: usize| u32::try_from(v).unwrap().to_le_bytes();
    let mut out = Vec::new();
    out.extend_from_slice(&0x9504_12de_u32.to_le_bytes());
    out.extend_from_slice(&word(0));
    out.extend_from_slice(&word(count));
    out.extend_from_slice(&word(originals_offset));
    out.extend_from_slice(&word(translations_offset));
    out.extend_from_slice(&word(0));
    out.extend_from_slice(&word(0));
    for (len, off) in tables.into_iter().chain(translated_table) {
        out.extend_from_slice(&word(len));
        out.extend_from_slice(&word(off));
    }
    out.extend_from_slice(&strings);
    out
}

fn write_catalog(root: &Path, locale: &str, entries: &[(&str, &str)]) {
    let dir = root.join(locale).join("LC_MESSAGES");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("messages.mo"), encode_mo(entries)).unwrap();
}

// ============================================================
// Lookup
// ============================================================

#[test]
fn test_loaded_locale_translates_and_unknown_locale_degrades() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path(), "uk", &[("test", "тест")]);

    let translator = I18nTranslator::builder()
        .default_translations(dir.path())
        .build()
        .unwrap();

    assert_eq!(translator.gettext("test", None, 1, Some("uk")), "тест");
    assert_eq!(translator.gettext("test", None, 1, Some("it")), "test");
}

#[test]
fn test_default_translations_replace_builtins() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path(), "uk", &[("test", "тест")]);

    let translator = I18nTranslator::builder()
        .default_translations(dir.path())
        .build()
        .unwrap();

    let locales: Vec<String> = translator.available_translations().into_iter().collect();
    assert_eq!(locales, vec!["uk".to_string()]);
    assert_eq!(translator.t("login", "uk"), "login");
}

#[test]
fn test_extra_translations_merge_over_builtins() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path(), "uk", &[("test", "тест")]);
    write_catalog(dir.path(), "pl", &[("login", "Zaloguj")]);

    let builtin = I18nTranslator::builder().build().unwrap();
    let translator = I18nTranslator::builder()
        .extra_translations(dir.path())
        .build()
        .unwrap();

    assert_eq!(translator.t("test", "uk"), "тест");
    assert_eq!(translator.t("login", "uk"), builtin.t("login", "uk"));
    assert_eq!(translator.t("login", "pl"), "Zaloguj");
}

#[test]
fn test_plural_forms_from_header() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(
        dir.path(),
        "uk",
        &[
            (
                "",
                "Content-Type: text/plain; charset=UTF-8\nPlural-Forms: nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);\n",
            ),
            ("file\0files", "файл\0файли\0файлів"),
        ],
    );

    let translator = I18nTranslator::builder()
        .default_translations(dir.path())
        .build()
        .unwrap();

    let form = |n| translator.gettext("file", Some("files"), n, Some("uk"));
    assert_eq!(form(1), "файл");
    assert_eq!(form(3), "файли");
    assert_eq!(form(7), "файлів");
    assert_eq!(form(21), "файл");
}

// ============================================================
// Reloading
// ============================================================

#[test]
fn test_reload_picks_up_new_catalogs() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path(), "uk", &[("test", "тест")]);

    let translator = I18nTranslator::builder()
        .default_translations(dir.path())
        .build()
        .unwrap();
    assert_eq!(translator.t("test", "de"), "test");

    write_catalog(dir.path(), "de", &[("test", "Prüfung")]);
    translator.reload_locales().unwrap();
    assert_eq!(translator.t("test", "de"), "Prüfung");
}

#[test]
fn test_corrupt_catalog_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let lc = dir.path().join("uk").join("LC_MESSAGES");
    std::fs::create_dir_all(&lc).unwrap();
    std::fs::write(lc.join("messages.mo"), b"garbage").unwrap();

    let result = I18nTranslator::builder()
        .default_translations(dir.path())
        .build();
    assert!(matches!(result, Err(AdminError::Configuration(_))));
}
