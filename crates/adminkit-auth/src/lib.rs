//! # adminkit-auth
//!
//! Authentication for the adminkit admin panel.
//!
//! ## Modules
//!
//! - [`hasher`] - Password hashing with Argon2id
//! - [`cache`] - Session stores (in-memory, Redis with the `redis` feature)
//! - [`provider`] - [`SecurityProvider`]: login, logout, first admin, password renewal

pub mod cache;
pub mod hasher;
pub mod provider;

pub use cache::{cache_from_settings, CacheStore, InMemoryCache};
#[cfg(feature = "redis")]
pub use cache::RedisCache;
pub use hasher::{Argon2PasswordHasher, PasswordHasher};
pub use provider::{SecurityProvider, SecurityProviderBuilder, SESSION_COOKIE};
