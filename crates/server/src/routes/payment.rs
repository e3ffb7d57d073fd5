//! Payment route handlers.
//!
//! `create-order` opens a gateway order for the checkout amount and hands
//! the client what its payment widget needs. `verify` checks the HMAC
//! confirmation signature, marks the order paid, and dispatches the order
//! confirmation email best-effort.
//!
//! In simulated mode `create-order` also returns a fabricated payment
//! reference and its signature, so the demo client can settle through the
//! same `verify` path without a real payment widget.

use axum::http::StatusCode;
use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use luxemarket_core::OrderId;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::PaymentResult;
use crate::payment::{simulated_settlement, to_minor_units, verify_signature};
use crate::state::AppState;

/// Body for `POST /payment/create-order`.
#[derive(Debug, Deserialize)]
pub struct CreateGatewayOrderRequest {
    /// Checkout total in major units (e.g. `99.99`).
    pub amount: Decimal,
}

/// Response for `POST /payment/create-order`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGatewayOrderResponse {
    pub order_id: String,
    /// Amount in minor units, as the gateway widget expects.
    pub amount: i64,
    pub currency: String,
    /// Publishable key id for the client-side widget.
    pub key_id: String,
    /// Synthetic payment reference, simulated mode only. With no real
    /// widget to collect payment, the demo client submits this to `verify`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// Confirmation signature matching `payment_id`, simulated mode only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Body for `POST /payment/verify`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    /// Gateway order reference from `create-order`.
    pub gateway_order_id: String,
    /// Gateway payment reference from the client widget.
    pub payment_id: String,
    /// Hex HMAC-SHA256 confirmation signature.
    pub signature: String,
    /// Ledger order to mark paid once the signature checks out.
    pub order_id: i64,
}

/// `POST /payment/create-order` - open a gateway order for a checkout amount.
#[instrument(skip(state, auth, body), fields(user = %auth.0.id))]
pub async fn create_gateway_order(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<CreateGatewayOrderRequest>,
) -> Result<(StatusCode, Json<CreateGatewayOrderResponse>)> {
    if body.amount <= Decimal::ZERO {
        return Err(AppError::BadRequest("amount must be positive".to_string()));
    }

    let amount = to_minor_units(body.amount).map_err(AppError::Payment)?;
    let receipt = format!("rcpt_{}", auth.0.id);

    let order = state.gateway().create_order(amount, &receipt).await?;

    let (payment_id, signature) = if state.gateway().is_simulated() {
        let (payment_id, signature) =
            simulated_settlement(&state.config().gateway.key_secret, &order.id)
                .map_err(AppError::Payment)?;
        (Some(payment_id), Some(signature))
    } else {
        (None, None)
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateGatewayOrderResponse {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            key_id: state.config().gateway.key_id.clone(),
            payment_id,
            signature,
        }),
    ))
}

/// `POST /payment/verify` - verify the confirmation signature and settle.
#[instrument(skip(state, auth, body), fields(user = %auth.0.id))]
pub async fn verify(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<VerifyPaymentRequest>,
) -> Result<Json<Value>> {
    verify_signature(
        &state.config().gateway.key_secret,
        &body.gateway_order_id,
        &body.payment_id,
        &body.signature,
    )?;

    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get(OrderId::new(body.order_id))
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_string()))?;

    if order.user_id != auth.0.id && !auth.0.is_admin {
        return Err(AppError::Forbidden(
            "order belongs to another user".to_string(),
        ));
    }

    let order = repo
        .mark_paid(order.id, &PaymentResult::completed(body.payment_id.as_str()))
        .await?;

    let user = auth.0;
    if let Err(e) = state
        .mailer()
        .send_order_confirmation(user.email.as_str(), &user.name, &order)
        .await
    {
        tracing::warn!(
            email = %user.email,
            order = %order.id,
            error = %e,
            "failed to send order confirmation email"
        );
    }

    Ok(Json(json!({ "message": "Payment verified successfully" })))
}
