//! Password hashing.
//!
//! Hashing and verification are CPU-bound, so [`Argon2PasswordHasher`] runs
//! them on `tokio::task::spawn_blocking`.

use adminkit_core::{AdminError, AdminResult};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;

/// Hashes and verifies admin passwords.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hashes `password` with a fresh salt.
    async fn hash(&self, password: &str) -> AdminResult<String>;

    /// Returns `true` if `password` matches `hash`.
    async fn verify(&self, password: &str, hash: &str) -> AdminResult<bool>;

    /// Returns `true` if `hash` was made with outdated parameters.
    fn is_rehashing_required(&self, hash: &str) -> bool;
}

/// Argon2id hasher.
#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2PasswordHasher {
    /// A hasher with the recommended parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A hasher with custom cost parameters.
    pub const fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }
}

fn join_error(e: tokio::task::JoinError) -> AdminError {
    AdminError::Internal(format!("Task join error: {e}"))
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &str) -> AdminResult<String> {
        let password = password.to_string();
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || {
            use argon2::password_hash::PasswordHasher as _;

            let salt = SaltString::generate(&mut OsRng);
            let hash = Self::argon2(params)
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| AdminError::Internal(format!("Argon2 hash error: {e}")))?;
            Ok(hash.to_string())
        })
        .await
        .map_err(join_error)?
    }

    async fn verify(&self, password: &str, hash: &str) -> AdminResult<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        let params = self.params.clone();
        tokio::task::spawn_blocking(move || {
            use argon2::password_hash::PasswordVerifier as _;

            let Ok(parsed) = PasswordHash::new(&hash) else {
                tracing::warn!("Stored password hash is not in PHC format");
                return Ok(false);
            };
            Ok(Self::argon2(params)
                .verify_password(password.as_bytes(), &parsed)
                .is_ok())
        })
        .await
        .map_err(join_error)?
    }

    fn is_rehashing_required(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }
        Params::try_from(&parsed).map_or(true, |stored| {
            stored.m_cost() != self.params.m_cost()
                || stored.t_cost() != self.params.t_cost()
                || stored.p_cost() != self.params.p_cost()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2PasswordHasher {
        Argon2PasswordHasher::with_params(Params::new(8, 1, 1, None).unwrap())
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = cheap();
        let hash = hasher.hash("secret").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("secret", &hash).await.unwrap());
        assert!(!hasher.verify("wrong", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_unique_salts() {
        let hasher = cheap();
        let first = hasher.hash("same").await.unwrap();
        let second = hasher.hash("same").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_plaintext_never_verifies() {
        let hasher = cheap();
        assert!(!hasher.verify("secret", "secret").await.unwrap());
        assert!(hasher.is_rehashing_required("secret"));
    }

    #[tokio::test]
    async fn test_rehash_when_params_change() {
        let old = cheap();
        let hash = old.hash("secret").await.unwrap();
        assert!(!old.is_rehashing_required(&hash));

        let stronger = Argon2PasswordHasher::with_params(Params::new(16, 2, 1, None).unwrap());
        assert!(stronger.is_rehashing_required(&hash));
        // Old hashes still verify under new parameters.
        assert!(stronger.verify("secret", &hash).await.unwrap());
    }

    #[test]
    fn test_other_variants_need_rehash() {
        let hasher = Argon2PasswordHasher::new();
        assert!(hasher.is_rehashing_required("$argon2i$v=19$m=65536,t=3,p=1$YWJjZGVmZ2g$ZGVmZ2hpamtsbW5vcHFyc3R1dnd4eXo"));
    }
}
