//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! luxemarket-cli admin create -e admin@example.com -n "Admin Name" -p <password>
//! ```
//!
//! Admin accounts are created verified, with no pending OTP.

use luxemarket_core::Email;
use luxemarket_server::services::auth::hash_password;

use super::{CommandError, connect};

/// Create a new admin user.
///
/// # Errors
///
/// Returns an error if the email is invalid, the password too short, the
/// email is already taken, or the database is unreachable.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<i64, CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::Invalid(format!("email: {e}")))?;

    if password.len() < 8 {
        return Err(CommandError::Invalid(
            "password must be at least 8 characters".to_owned(),
        ));
    }

    let password_hash =
        hash_password(password).map_err(|e| CommandError::Invalid(e.to_string()))?;

    let pool = connect().await?;

    tracing::info!("Creating admin user: {}", email);

    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&pool)
        .await?;

    if existing.is_some() {
        return Err(CommandError::Invalid(format!(
            "user already exists with email: {email}"
        )));
    }

    let user_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, email, password_hash, is_admin, is_verified)
         VALUES ($1, $2, $3, TRUE, TRUE)
         RETURNING id",
    )
    .bind(name)
    .bind(email.as_str())
    .bind(&password_hash)
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user_id,
        email
    );

    Ok(user_id)
}
