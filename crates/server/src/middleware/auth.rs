//! Authentication middleware and extractors.
//!
//! Bearer tokens from the `Authorization` header are validated and resolved
//! to a live user row on every request; a deleted account invalidates its
//! outstanding tokens immediately.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let user_id = state
            .tokens()
            .validate(token)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let user = UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

        Ok(Self(user))
    }
}

/// Extractor that requires a valid bearer token for an admin account.
///
/// Rejects with 401 when the token is missing or invalid, 403 when the
/// account is valid but not an admin.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.is_admin {
            return Err(AppError::Forbidden("admin access required".to_string()));
        }

        Ok(Self(user))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with_auth("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_scheme_rejected() {
        let parts = parts_with_auth("abc.def.ghi");
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_empty_token_rejected() {
        let parts = parts_with_auth("Bearer ");
        assert_eq!(bearer_token(&parts), None);
    }
}
