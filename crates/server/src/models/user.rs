//! User account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use luxemarket_core::{Email, UserId};

/// A user account as exposed to handlers and API responses.
///
/// The password hash and any pending OTP never leave the repository layer;
/// this struct is what token validation resolves to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub is_admin: bool,
    pub is_verified: bool,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serialization_is_camel_case_and_skips_timestamps() {
        let user = User {
            id: UserId::new(1),
            name: "Ann".to_string(),
            email: Email::parse("ann@x.com").unwrap(),
            phone: None,
            is_admin: false,
            is_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["isVerified"], true);
        assert_eq!(json["email"], "ann@x.com");
        assert!(json.get("phone").is_none());
        assert!(json.get("createdAt").is_none());
    }
}
