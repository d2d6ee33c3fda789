//! # adminkit-core
//!
//! Core types, settings, translation catalogs, and error types for the adminkit
//! admin panel. This crate has no web framework dependencies and provides the
//! foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and result alias
//! - [`settings`] - Admin settings with sensible defaults
//! - [`settings_loader`] - TOML loading and environment overrides
//! - [`logging`] - Tracing-based logging integration
//! - [`i18n`] - Compiled gettext catalogs and the [`Translator`](i18n::Translator) contract
//! - [`files`] - Upload handling through pluggable file managers

pub mod error;
pub mod files;
pub mod i18n;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{AdminError, AdminResult};
pub use settings::AdminSettings;
