//! Stateless JWT issuance and validation.
//!
//! Tokens are HS256-signed with the configured secret, carry the user id in
//! `sub`, and stay valid for thirty days. There is no server-side session
//! store; clients hold the token and present it as a bearer credential.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use luxemarket_core::UserId;

/// How long an issued token stays valid.
const TOKEN_VALIDITY: Duration = Duration::days(30);

/// Errors that can occur issuing or validating tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to encode token")]
    Encode(#[source] jsonwebtoken::errors::Error),
    #[error("token is expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    iat: i64,
    exp: i64,
}

/// Issues and validates bearer tokens for authenticated requests.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Create a token service from the signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a token for the given user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_with_validity(user_id, TOKEN_VALIDITY)
    }

    fn issue_with_validity(
        &self,
        user_id: UserId,
        validity: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.as_i64(),
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(TokenError::Encode)
    }

    /// Validate a token and extract the user id it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for an expired token, `TokenError::Invalid`
    /// for anything else (bad signature, malformed, wrong algorithm).
    pub fn validate(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default()).map_err(
            |e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            },
        )?;

        Ok(UserId::new(data.claims.sub))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("test-signing-secret-with-enough-length"))
    }

    #[test]
    fn test_issue_and_validate_roundtrip() {
        let tokens = service();
        let token = tokens.issue(UserId::new(42)).unwrap();
        let user_id = tokens.validate(&token).unwrap();
        assert_eq!(user_id, UserId::new(42));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let token = tokens
            .issue_with_validity(UserId::new(7), Duration::days(-1))
            .unwrap();
        assert!(matches!(tokens.validate(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = service();
        let token = tokens.issue(UserId::new(7)).unwrap();
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push(if token.ends_with('A') { 'B' } else { 'A' });
        assert!(matches!(
            tokens.validate(&tampered),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let tokens = service();
        let other = TokenService::new(&SecretString::from("a-different-secret-with-enough-length"));
        let token = tokens.issue(UserId::new(7)).unwrap();
        assert!(matches!(other.validate(&token), Err(TokenError::Invalid)));
    }
}
