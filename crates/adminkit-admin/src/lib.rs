//! # adminkit-admin
//!
//! Model resources, navigation, and the composition root of the adminkit
//! admin panel. Resources are scaffolded from column metadata through the
//! converters of an [`OrmBackend`], served by CRUD routes, and wrapped with
//! the providers the application plugs in.
//!
//! ## Modules
//!
//! - [`column`] - Column and model metadata
//! - [`field`] - Fields and computed fields
//! - [`converters`] - Column-to-field converter registry
//! - [`backend`] - The [`OrmBackend`] contract and list DTOs
//! - [`dao`] - The [`AdminDao`](dao::AdminDao) contract for admin accounts
//! - [`resource`] - [`ModelResource`] scaffolding and rendering
//! - [`hooks`] - List-page overrides
//! - [`actions`] - Toolbar, row and bulk actions
//! - [`menu`] - Navigation menu
//! - [`provider`] - The [`Provider`] plug-in contract
//! - [`state`] - Shared state and the per-request [`Page`](state::Page)
//! - [`middleware`] - Locale, theme and error-page middleware
//! - [`app`] - [`AdminApp`] and its builder

pub mod actions;
pub mod app;
pub mod backend;
pub mod column;
pub mod converters;
pub mod dao;
pub mod field;
pub mod hooks;
pub mod menu;
pub mod middleware;
pub mod provider;
pub mod resource;
mod routes;
pub mod state;

#[cfg(test)]
mod testing;

pub use app::{AdminApp, AdminAppBuilder};
pub use backend::{OrmBackend, Pagination, ResolvedForm, ResourceList, Row};
pub use column::{ColumnKind, ColumnMeta, ModelMeta, Relation, Through};
pub use field::{Field, FieldDecl};
pub use menu::{Dropdown, Link, MenuEntry};
pub use provider::Provider;
pub use resource::{ModelResource, ModelResourceBuilder};
pub use state::{AdminState, CurrentAdmin, Page};
