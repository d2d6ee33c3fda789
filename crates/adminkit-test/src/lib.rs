//! # adminkit-test
//!
//! Testing support for adminkit apps: a [`TestClient`] that drives an axum
//! router in-process with a cookie jar, and assertion helpers for the
//! redirects and pages the admin produces.

pub mod assertions;
pub mod client;

pub use assertions::{assert_contains, assert_not_contains, assert_redirects, assert_status};
pub use client::{Multipart, SetCookie, TestClient, TestResponse};
