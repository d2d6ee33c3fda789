//! # adminkit-http
//!
//! HTTP plumbing shared by the admin routes and providers.
//!
//! ## Modules
//!
//! - [`cookies`] - `Set-Cookie` building and `Cookie` header parsing
//! - [`form`] - [`FormData`](form::FormData) extraction from urlencoded and multipart bodies
//! - [`locale`] - Per-request locale resolution
//! - [`response`] - Redirects, HTML responses, and the [`HttpError`](response::HttpError) wrapper

pub mod cookies;
pub mod form;
pub mod locale;
pub mod response;

pub use cookies::Cookie;
pub use form::FormData;
pub use locale::LocaleStrategy;
pub use response::{ErrorPage, HttpError, HttpResult};
