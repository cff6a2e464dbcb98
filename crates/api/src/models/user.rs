//! Customer accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use luxuffy_core::{Email, UserId};

/// A customer authenticated by bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}
