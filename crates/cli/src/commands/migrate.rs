//! Database migration command.
//!
//! Applies every pending migration from `crates/api/migrations/`. The
//! migration files are embedded at compile time.

use super::{CommandError, connect};

/// Run pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
