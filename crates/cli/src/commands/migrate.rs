//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! luxemarket-cli migrate
//! ```
//!
//! Migration files live in `crates/server/migrations/`. The server never
//! applies them on startup; this command is the only migration path.

use super::{CommandError, connect};

/// Run all pending database migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
