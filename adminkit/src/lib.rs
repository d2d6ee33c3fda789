//! # adminkit
//!
//! A pluggable admin panel for axum applications.
//!
//! This is the facade crate that re-exports the workspace. Depend on
//! `adminkit` for everything, or on the individual crates for finer control.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use adminkit::prelude::*;
//!
//! # async fn run() -> AdminResult<()> {
//! let settings = AdminSettings::default();
//! let backend = SqlBackend::from_settings(&settings)?;
//! let users = backend.introspect("user").await?;
//! let security = SecurityProvider::from_settings(&settings).await?;
//!
//! let app = AdminApp::builder(settings, Arc::new(backend))
//!     .provider(security)
//!     .resource(ModelResource::builder(users).filters(["username"]))
//!     .build()?;
//! let router: axum::Router = app.into_router();
//! # let _ = router;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `sql` (default) - the SQLite dialect
//! - `document` (default) - the in-memory document dialect
//! - `redis` - the Redis session store
//! - `s3` - the S3 file manager
//! - `testing` - re-exports [`adminkit_test`] as [`test`]

/// Errors, settings, logging, i18n and file managers.
pub use adminkit_core as core;

/// Cookies, form data, locale resolution and response helpers.
pub use adminkit_http as http;

/// The tera engine and the bundled templates.
pub use adminkit_template as template;

/// Displays, inputs and filters.
pub use adminkit_widgets as widgets;

/// Resources, menus, providers and the app builder.
pub use adminkit_admin as admin;

/// Password hashing, session stores and the login provider.
pub use adminkit_auth as auth;

/// The SQL and document dialects.
pub use adminkit_backends as backends;

/// Test client and assertions.
#[cfg(feature = "testing")]
pub use adminkit_test as test;

pub use async_trait::async_trait;
pub use axum;
pub use serde_json;
pub use tokio;
pub use tracing;

/// The types most apps need.
pub mod prelude {
    pub use adminkit_admin::actions::{Action, ToolbarAction};
    pub use adminkit_admin::column::{ColumnKind, ColumnMeta, ModelMeta, Relation, Through};
    pub use adminkit_admin::field::{Field, FieldDecl};
    pub use adminkit_admin::hooks::ResourceHooks;
    pub use adminkit_admin::menu::{Dropdown, Link, MenuEntry};
    pub use adminkit_admin::{
        AdminApp, AdminAppBuilder, AdminState, CurrentAdmin, ModelResource, OrmBackend, Page,
        Provider,
    };
    pub use adminkit_auth::{Argon2PasswordHasher, CacheStore, InMemoryCache, PasswordHasher, SecurityProvider};
    #[cfg(feature = "document")]
    pub use adminkit_backends::document::{DocumentBackend, DocumentStore};
    #[cfg(feature = "sql")]
    pub use adminkit_backends::sql::SqlBackend;
    pub use adminkit_core::logging::setup_logging;
    pub use adminkit_core::{AdminError, AdminResult, AdminSettings};
    pub use adminkit_widgets::{displays, filters, inputs};
}
