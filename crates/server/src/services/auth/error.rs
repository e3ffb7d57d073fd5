//! Authentication error types.

use luxemarket_core::{EmailError, OtpCodeError};

use crate::db::RepositoryError;
use crate::services::token::TokenError;

/// Errors for signup, verification, and login flows.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error("invalid verification code: {0}")]
    InvalidCode(#[from] OtpCodeError),
    #[error("an account with this email already exists")]
    UserAlreadyExists,
    #[error("no account found for this email")]
    UserNotFound,
    #[error("no verification is pending for this account")]
    NoPendingCode,
    #[error("verification code has expired")]
    CodeExpired,
    #[error("verification code does not match")]
    CodeMismatch,
    #[error("account is already verified")]
    AlreadyVerified,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("password too weak: {0}")]
    WeakPassword(String),
    #[error("password hashing failed")]
    PasswordHash,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Token(#[from] TokenError),
}
