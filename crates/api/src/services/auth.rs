//! Bearer-token authentication.
//!
//! Tokens are 32 random bytes, base64url encoded. Only their SHA-256 hex
//! digest is stored.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::instrument;

use luxuffy_core::Email;

use super::ServiceError;
use crate::models::User;
use crate::store::CommerceStore;

/// Hash a plaintext token for storage or lookup.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Generate a fresh plaintext token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub struct AuthService<'a> {
    store: &'a dyn CommerceStore,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn CommerceStore) -> Self {
        Self { store }
    }

    /// Create the user if needed and issue a new token.
    ///
    /// Returns the user and the plaintext token; the plaintext is not kept.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed email, `Store` on storage failure.
    #[instrument(skip(self))]
    pub async fn issue_token(&self, email: &str) -> Result<(User, String), ServiceError> {
        let email =
            Email::parse(email).map_err(|e| ServiceError::invalid_field("email", e.to_string()))?;
        let user = self.store.upsert_user(&email).await?;
        let token = generate_token();
        self.store.create_token(user.id, &hash_token(&token)).await?;
        tracing::info!(user_id = %user.id, "Issued API token");
        Ok((user, token))
    }

    /// Resolve a plaintext token to its user.
    ///
    /// # Errors
    ///
    /// `Store` on storage failure. Unknown tokens are `Ok(None)`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, ServiceError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self.store.user_for_token(&hash_token(token)).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_hash_is_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[tokio::test]
    async fn test_issued_token_authenticates() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let (user, token) = auth.issue_token("ada@example.ng").await.unwrap();

        let found = auth.authenticate(&token).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(auth.authenticate("not-a-token").await.unwrap().is_none());
        assert!(auth.authenticate("  ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_issue_token_reuses_existing_user() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let (first, _) = auth.issue_token("ada@example.ng").await.unwrap();
        let (second, _) = auth.issue_token("ada@example.ng").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_issue_token_rejects_bad_email() {
        let store = MemoryStore::new();
        let err = AuthService::new(&store)
            .issue_token("not an email")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }
}
