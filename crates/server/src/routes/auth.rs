//! Authentication route handlers.
//!
//! Signup stores the account and dispatches the verification code by email
//! best-effort: a failed send never rolls back the signup, it is logged
//! (with the code, so operators can relay it) and the client can use the
//! resend endpoint.

use axum::{Json, extract::State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use luxemarket_core::OtpCode;

use crate::error::Result;
use crate::models::User;
use crate::services::auth::{AuthService, Signup};
use crate::state::AppState;

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

/// Verify request body.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub otp: String,
}

/// Resend-code request body.
#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authenticated response: the user's public fields plus a bearer token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub is_admin: bool,
    pub is_verified: bool,
    pub token: String,
}

impl AuthResponse {
    fn new(user: User, token: String) -> Self {
        Self {
            id: user.id.as_i64(),
            name: user.name,
            email: user.email.to_string(),
            phone: user.phone,
            is_admin: user.is_admin,
            is_verified: user.is_verified,
            token,
        }
    }
}

/// `POST /auth/signup` - register an account and email a verification code.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let auth = AuthService::new(state.pool(), state.tokens());

    let (user, otp) = auth
        .register(&Signup {
            name: body.name.trim(),
            email: &body.email,
            password: &body.password,
            phone: body.phone.as_deref(),
        })
        .await?;

    dispatch_code(&state, &user, &otp).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Account created. Check your email for the verification code.",
            "email": user.email,
        })),
    ))
}

/// `POST /auth/verify` - confirm a verification code and log in.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn verify(
    State(state): State<AppState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let (user, token) = auth.confirm(&body.email, &body.otp).await?;

    Ok(Json(AuthResponse::new(user, token)))
}

/// `POST /auth/resend-otp` - issue and email a fresh verification code.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(body): Json<ResendRequest>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let (user, otp) = auth.resend_code(&body.email).await?;

    dispatch_code(&state, &user, &otp).await;

    Ok(Json(json!({
        "message": "A new verification code has been sent.",
    })))
}

/// `POST /auth/login` - password login.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), state.tokens());
    let (user, token) = auth.login(&body.email, &body.password).await?;

    Ok(Json(AuthResponse::new(user, token)))
}

/// Best-effort code dispatch. Failures are logged with the code so it can
/// be relayed manually; the account state is already committed.
async fn dispatch_code(state: &AppState, user: &User, otp: &OtpCode) {
    if let Err(e) = state
        .mailer()
        .send_verification_code(user.email.as_str(), &user.name, otp.as_str())
        .await
    {
        tracing::warn!(
            email = %user.email,
            code = %otp,
            error = %e,
            "failed to send verification code email"
        );
    }
}
