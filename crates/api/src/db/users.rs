//! User and API token repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use luxuffy_core::{Email, UserId};

use super::RepositoryError;
use crate::models::User;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for users and their bearer tokens.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve a token digest to its user, touching `last_used_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, token_hash))]
    pub async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE api_tokens t
            SET last_used_at = NOW()
            FROM users u
            WHERE t.token_hash = $1 AND u.id = t.user_id
            RETURNING u.id, u.email, u.created_at
            ",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get the user with this email, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn upsert(&self, email: &Email) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email)
            VALUES ($1)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, email, created_at
            ",
        )
        .bind(email.as_str())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Store a token digest for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the digest already exists.
    #[instrument(skip(self, token_hash))]
    pub async fn create_token(
        &self,
        user_id: UserId,
        token_hash: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO api_tokens (user_id, token_hash) VALUES ($1, $2)")
            .bind(user_id)
            .bind(token_hash)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "token"))?;
        Ok(())
    }
}
