//! Authentication service.
//!
//! Signup issues a six-digit verification code with a ten-minute validity
//! window and stores it alongside the new account; verification checks
//! expiry before comparing codes and flips the account to verified exactly
//! once. Login is deliberately permissive about verification state: an
//! unverified account can still log in, matching the storefront's checkout
//! flow where verification only gates marketing email.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use luxemarket_core::{Email, OTP_VALIDITY_MINUTES, OtpCode};

use crate::db::RepositoryError;
use crate::db::users::{NewUserRecord, OtpState, UserRepository};
use crate::models::User;
use crate::services::token::TokenService;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Signup request fields after transport-level deserialization.
pub struct Signup<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub phone: Option<&'a str>,
}

/// Authentication service.
///
/// Handles signup, email verification, code resend, and login.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Register a new account and issue its first verification code.
    ///
    /// Returns the created user and the plaintext code for email dispatch.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, signup: &Signup<'_>) -> Result<(User, OtpCode), AuthError> {
        let email = Email::parse(signup.email)?;
        validate_password(signup.password)?;
        let password_hash = hash_password(signup.password)?;

        let otp = OtpCode::generate();
        let otp_expires_at = Utc::now() + Duration::minutes(OTP_VALIDITY_MINUTES);

        let user = self
            .users
            .create(&NewUserRecord {
                name: signup.name,
                email: &email,
                password_hash: &password_hash,
                phone: signup.phone,
                otp: &otp,
                otp_expires_at,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok((user, otp))
    }

    /// Confirm a verification code, mark the account verified, and log it in.
    ///
    /// Expiry is checked before code equality, so an expired-but-correct code
    /// reports `CodeExpired` rather than leaking whether it matched.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no such account exists.
    /// Returns `AuthError::NoPendingCode` if no verification is pending.
    /// Returns `AuthError::CodeExpired` if the code's window has passed.
    /// Returns `AuthError::CodeMismatch` if the code is wrong.
    pub async fn confirm(&self, email: &str, code: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email)?;

        // Account lookup comes first: an unknown email reports NotFound even
        // when the submitted code is malformed.
        let (user, state) = self
            .users
            .get_otp_state(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        evaluate_pending_code(state.as_ref(), code, Utc::now())?;

        let user = self.users.clear_otp_and_verify(user.id).await?;
        let token = self.tokens.issue(user.id)?;

        Ok((user, token))
    }

    /// Replace any pending verification code with a fresh one.
    ///
    /// Returns the user and the new plaintext code for email dispatch.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no such account exists.
    /// Returns `AuthError::AlreadyVerified` if the account needs no code.
    pub async fn resend_code(&self, email: &str) -> Result<(User, OtpCode), AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let otp = OtpCode::generate();
        let expires_at = Utc::now() + Duration::minutes(OTP_VALIDITY_MINUTES);
        self.users.set_otp(user.id, &otp, expires_at).await?;

        Ok((user, otp))
    }

    /// Login with email and password, returning the user and a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = self.tokens.issue(user.id)?;

        Ok((user, token))
    }
}

/// Decide whether a submitted code confirms the pending verification.
///
/// Expiry is checked before anything touches the code value, so an expired
/// code reports `CodeExpired` even when it would have matched exactly.
fn evaluate_pending_code(
    state: Option<&OtpState>,
    code: &str,
    now: DateTime<Utc>,
) -> Result<(), AuthError> {
    let state = state.ok_or(AuthError::NoPendingCode)?;

    if state.expires_at < now {
        return Err(AuthError::CodeExpired);
    }

    let submitted = OtpCode::parse(code)?;
    if !state.code.matches(&submitted) {
        return Err(AuthError::CodeMismatch);
    }

    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id. Public so the admin CLI can reuse it.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password!", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            validate_password("seven77"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("eight888").is_ok());
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("whatever-pass", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    fn pending(code: &str, expires_in: Duration) -> OtpState {
        OtpState {
            code: OtpCode::parse(code).unwrap(),
            expires_at: Utc::now() + expires_in,
        }
    }

    #[test]
    fn test_no_pending_code() {
        assert!(matches!(
            evaluate_pending_code(None, "123456", Utc::now()),
            Err(AuthError::NoPendingCode)
        ));
    }

    #[test]
    fn test_expired_code_fails_even_when_it_matches() {
        let state = pending("123456", Duration::minutes(-1));
        assert!(matches!(
            evaluate_pending_code(Some(&state), "123456", Utc::now()),
            Err(AuthError::CodeExpired)
        ));
    }

    #[test]
    fn test_wrong_code_is_a_mismatch() {
        let state = pending("123456", Duration::minutes(10));
        assert!(matches!(
            evaluate_pending_code(Some(&state), "654321", Utc::now()),
            Err(AuthError::CodeMismatch)
        ));
    }

    #[test]
    fn test_malformed_code_rejected() {
        let state = pending("123456", Duration::minutes(10));
        assert!(matches!(
            evaluate_pending_code(Some(&state), "12ab56", Utc::now()),
            Err(AuthError::InvalidCode(_))
        ));
    }

    #[test]
    fn test_correct_unexpired_code_confirms() {
        let state = pending("123456", Duration::minutes(10));
        assert!(evaluate_pending_code(Some(&state), "123456", Utc::now()).is_ok());
    }
}
