//! # adminkit-template
//!
//! Template rendering for the admin panel, built on Tera.
//!
//! Every page and widget template ships embedded in the crate. Applications
//! can point [`Templates`] at their own folders; a file there replaces the
//! built-in template with the same relative name, and new names such as
//! `user/list.html` become available for per-resource overrides.
//!
//! Templates translate strings through the `t` function:
//!
//! ```text
//! {{ t(key="login", locale=current_locale) }}
//! {{ t(key="%(count)s entry", plural="%(count)s entries", n=total, count=total, locale=current_locale) }}
//! ```

pub mod engine;
pub mod functions;
pub mod loaders;

pub use engine::Templates;
pub use tera::Context;
