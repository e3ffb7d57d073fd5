//! One-time verification codes.
//!
//! A 6-digit numeric code issued at signup (and on resend) to prove control
//! of an email address. The code is paired with an absolute expiry timestamp
//! wherever it is persisted; both fields travel together.

use core::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// How long an issued code stays valid.
pub const OTP_VALIDITY_MINUTES: i64 = 10;

/// Number of digits in a code.
const OTP_DIGITS: usize = 6;

/// Errors that can occur when parsing an [`OtpCode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum OtpCodeError {
    /// The input is not exactly six characters.
    #[error("code must be exactly {OTP_DIGITS} digits")]
    WrongLength,
    /// The input contains a non-digit character.
    #[error("code must contain only digits")]
    NonDigit,
}

/// A 6-digit one-time verification code.
///
/// Equality against a submitted code goes through [`OtpCode::matches`],
/// which compares in constant time. `PartialEq` is deliberately not
/// implemented so a plain `==` cannot sneak in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Generate a fresh code, uniformly at random over `000000..=999999`
    /// minus the leading-zero range the original scheme excludes
    /// (`100000..=999999`).
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;
        let code: u32 = rand::rng().random_range(100_000..1_000_000);
        Self(code.to_string())
    }

    /// Parse a code submitted by a client.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is exactly six ASCII digits.
    pub fn parse(s: &str) -> Result<Self, OtpCodeError> {
        let s = s.trim();
        if s.len() != OTP_DIGITS {
            return Err(OtpCodeError::WrongLength);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OtpCodeError::NonDigit);
        }
        Ok(Self(s.to_owned()))
    }

    /// Constant-time comparison against another code.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OtpCode {
    type Err = OtpCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OtpCode {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OtpCode {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OtpCode {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_format() {
        for _ in 0..100 {
            let code = OtpCode::generate();
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().bytes().all(|b| b.is_ascii_digit()));
            let n: u32 = code.as_str().parse().unwrap();
            assert!((100_000..1_000_000).contains(&n));
        }
    }

    #[test]
    fn test_parse_valid() {
        let code = OtpCode::parse("123456").unwrap();
        assert_eq!(code.as_str(), "123456");
        // Surrounding whitespace from copy-paste is tolerated
        assert_eq!(OtpCode::parse(" 123456 ").unwrap().as_str(), "123456");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(matches!(
            OtpCode::parse("12345"),
            Err(OtpCodeError::WrongLength)
        ));
        assert!(matches!(
            OtpCode::parse("1234567"),
            Err(OtpCodeError::WrongLength)
        ));
        assert!(matches!(OtpCode::parse(""), Err(OtpCodeError::WrongLength)));
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert!(matches!(
            OtpCode::parse("12a456"),
            Err(OtpCodeError::NonDigit)
        ));
    }

    #[test]
    fn test_matches() {
        let a = OtpCode::parse("123456").unwrap();
        let b = OtpCode::parse("123456").unwrap();
        let c = OtpCode::parse("123457").unwrap();
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
    }
}
