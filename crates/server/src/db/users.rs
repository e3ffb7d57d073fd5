//! User repository for database operations.
//!
//! Queries use the runtime-checked sqlx API (`query_as` with binds) against
//! the `users` table. The OTP pairing invariant is enforced here: the only
//! ways to touch `otp_code`/`otp_expires_at` are [`UserRepository::set_otp`]
//! (sets both) and [`UserRepository::clear_otp_and_verify`] (clears both).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use luxemarket_core::{Email, OtpCode, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::User;

/// Columns shared by every user query.
const USER_COLUMNS: &str = "id, name, email, phone, is_admin, is_verified, created_at, updated_at";

/// Row mapped from the public user columns.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    is_admin: bool,
    is_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(User {
            id: UserId::new(self.id),
            name: self.name,
            email,
            phone: self.phone,
            is_admin: self.is_admin,
            is_verified: self.is_verified,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// A pending verification code with its expiry, always read together.
#[derive(Debug, Clone)]
pub struct OtpState {
    pub code: OtpCode,
    pub expires_at: DateTime<Utc>,
}

/// Fields required to create an account. Accounts start unverified with a
/// freshly issued code.
pub struct NewUserRecord<'a> {
    pub name: &'a str,
    pub email: &'a Email,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
    pub otp: &'a OtpCode,
    pub otp_expires_at: DateTime<Utc>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Create a new unverified account with a pending verification code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewUserRecord<'_>) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (name, email, password_hash, phone, otp_code, otp_expires_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new.name)
        .bind(new.email.as_str())
        .bind(new.password_hash)
        .bind(new.phone)
        .bind(new.otp.as_str())
        .bind(new.otp_expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;

        row.into_user()
    }

    /// Get a user together with their password hash, by email.
    ///
    /// Returns `None` if no such account exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct CredentialRow {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        Ok(Some((r.user.into_user()?, r.password_hash)))
    }

    /// Get a user together with their pending verification code, if any.
    ///
    /// The two OTP columns are read as a pair; a row where only one of them
    /// is set is reported as data corruption.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the OTP columns disagree.
    pub async fn get_otp_state(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Option<OtpState>)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct OtpRow {
            #[sqlx(flatten)]
            user: UserRow,
            otp_code: Option<String>,
            otp_expires_at: Option<DateTime<Utc>>,
        }

        let row = sqlx::query_as::<_, OtpRow>(&format!(
            "SELECT {USER_COLUMNS}, otp_code, otp_expires_at FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let state = otp_state_from_columns(r.otp_code, r.otp_expires_at)?;

        Ok(Some((r.user.into_user()?, state)))
    }

    /// Persist a fresh verification code, superseding any prior one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_otp(
        &self,
        user_id: UserId,
        code: &OtpCode,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET otp_code = $1, otp_expires_at = $2, updated_at = NOW()
             WHERE id = $3",
        )
        .bind(code.as_str())
        .bind(expires_at)
        .bind(user_id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Mark the account verified and clear both OTP columns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn clear_otp_and_verify(&self, user_id: UserId) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users
             SET is_verified = TRUE, otp_code = NULL, otp_expires_at = NULL, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map_or(Err(RepositoryError::NotFound), UserRow::into_user)
    }
}

/// Map the two OTP columns to a pending state, enforcing that they are
/// always set or cleared as a pair.
fn otp_state_from_columns(
    code: Option<String>,
    expires_at: Option<DateTime<Utc>>,
) -> Result<Option<OtpState>, RepositoryError> {
    match (code, expires_at) {
        (Some(code), Some(expires_at)) => {
            let code = OtpCode::parse(&code)
                .map_err(|e| RepositoryError::DataCorruption(format!("invalid stored code: {e}")))?;
            Ok(Some(OtpState { code, expires_at }))
        }
        (None, None) => Ok(None),
        _ => Err(RepositoryError::DataCorruption(
            "otp_code and otp_expires_at must be set together".to_owned(),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_expiry_read_as_a_pair() {
        let state = otp_state_from_columns(Some("123456".to_owned()), Some(Utc::now()))
            .unwrap()
            .unwrap();
        assert_eq!(state.code.as_str(), "123456");

        assert!(otp_state_from_columns(None, None).unwrap().is_none());
    }

    #[test]
    fn test_half_set_pair_is_corruption() {
        assert!(matches!(
            otp_state_from_columns(Some("123456".to_owned()), None),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert!(matches!(
            otp_state_from_columns(None, Some(Utc::now())),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_unparseable_stored_code_is_corruption() {
        assert!(matches!(
            otp_state_from_columns(Some("12345".to_owned()), Some(Utc::now())),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
