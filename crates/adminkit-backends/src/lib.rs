//! # adminkit-backends
//!
//! The dialects adminkit ships with. Each one implements
//! [`OrmBackend`](adminkit_admin::OrmBackend): list with filters and
//! pagination, CRUD with many-to-many values, relation options and the
//! admin-account DAO.
//!
//! ## Features
//!
//! - `sql` (default) - [`sql::SqlBackend`] over SQLite via `rusqlite`
//! - `document` (default) - [`document::DocumentBackend`] over in-memory
//!   JSON collections

#[cfg(feature = "document")]
pub mod document;
#[cfg(feature = "sql")]
pub mod sql;

#[cfg(feature = "document")]
pub use document::{DocumentBackend, DocumentStore};
#[cfg(feature = "sql")]
pub use sql::{SqlBackend, SqlConnection};
