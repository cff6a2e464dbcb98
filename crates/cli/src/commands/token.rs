//! API token commands.
//!
//! ```bash
//! luxuffy-cli token create -e ada@example.com
//! ```
//!
//! The raw token is printed once. Only its SHA-256 hash is stored.

use luxuffy_api::services::AuthService;
use luxuffy_api::store::PgStore;

use super::{CommandError, connect};

/// Issue a bearer token for `email`, creating the user on first use.
///
/// # Errors
///
/// Returns an error for an invalid email or when the database is unreachable.
pub async fn create(email: &str) -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);
    let (user, token) = AuthService::new(&store).issue_token(email).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Issued API token");

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}
