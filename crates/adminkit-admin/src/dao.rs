//! Persistence of admin accounts.
//!
//! The security provider reads and writes accounts only through an
//! [`AdminDao`], so each dialect stores them in its own way.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use adminkit_core::AdminResult;

/// A stored admin account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminRecord {
    /// The primary key.
    pub id: Value,
    /// The login name.
    pub username: String,
    /// The password hash.
    pub password: String,
    /// Location of the avatar.
    pub profile_pic: Option<String>,
}

/// Selects one admin account.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminLookup {
    /// By primary key.
    Id(Value),
    /// By login name.
    Username(String),
}

/// Changes applied to an admin account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminUpdate {
    /// A new password hash.
    pub password: Option<String>,
    /// A new avatar location.
    pub profile_pic: Option<String>,
}

/// Where admin accounts live in a dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminModel {
    /// The table or collection.
    pub table: String,
    /// The primary key column.
    pub id_column: String,
    /// The login name column.
    pub username_column: String,
    /// The password hash column.
    pub password_column: String,
    /// The avatar column.
    pub profile_pic_column: String,
}

impl Default for AdminModel {
    fn default() -> Self {
        Self {
            table: "admin".to_string(),
            id_column: "id".to_string(),
            username_column: "username".to_string(),
            password_column: "password".to_string(),
            profile_pic_column: "profile_pic".to_string(),
        }
    }
}

/// Data access for admin accounts.
#[async_trait]
pub trait AdminDao: Send + Sync {
    /// Finds one account, or fails with `EntityNotFound`.
    async fn get_one_admin_by_filters(&self, lookup: &AdminLookup) -> AdminResult<AdminRecord>;

    /// Returns `true` once any account exists.
    async fn is_exists_at_least_one_admin(&self) -> AdminResult<bool>;

    /// Stores a new account. `password` must already be hashed.
    async fn add_admin(
        &self,
        username: &str,
        password: &str,
        profile_pic: Option<&str>,
    ) -> AdminResult<AdminRecord>;

    /// Applies `update` to the selected account.
    async fn update_admin(&self, lookup: &AdminLookup, update: &AdminUpdate) -> AdminResult<()>;
}
