//! Order route handlers.
//!
//! Access control: an order is visible to its owner and to admins; marking
//! delivered is admin-only. Both payment and delivery flips are exactly-once,
//! a replay gets 409.

use axum::http::StatusCode;
use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use luxemarket_core::{OrderId, UserId};

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{NewOrder, NewOrderItem, Order, PaymentResult, ShippingAddress, User};
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order_items: Vec<NewOrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
    pub payment_result: Option<PaymentResult>,
}

/// Payment confirmation body for `PUT /orders/{id}/pay`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub payment_reference: String,
}

/// `POST /orders` - create an order from the current cart.
#[instrument(skip(state, auth, body), fields(user = %auth.0.id))]
pub async fn create(
    State(state): State<AppState>,
    auth: RequireAuth,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    if body.order_items.is_empty() {
        return Err(AppError::BadRequest("no order items".to_string()));
    }
    for item in &body.order_items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(
                "item quantity must be positive".to_string(),
            ));
        }
    }

    let order = OrderRepository::new(state.pool())
        .create(
            auth.0.id,
            &NewOrder {
                order_items: body.order_items,
                shipping_address: body.shipping_address,
                payment_method: body.payment_method,
                items_price: body.items_price,
                tax_price: body.tax_price,
                shipping_price: body.shipping_price,
                total_price: body.total_price,
                payment_result: body.payment_result,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /orders/{id}` - fetch an order (owner or admin).
#[instrument(skip(state, auth), fields(user = %auth.0.id))]
pub async fn get(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_string()))?;

    ensure_can_view(&auth.0, &order)?;

    Ok(Json(order))
}

/// `GET /orders/myorders/{user_id}` - a user's order history.
#[instrument(skip(state, auth), fields(user = %auth.0.id))]
pub async fn list_for_user(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Order>>> {
    let target = UserId::new(user_id);
    if auth.0.id != target && !auth.0.is_admin {
        return Err(AppError::Forbidden(
            "cannot view another user's orders".to_string(),
        ));
    }

    let orders = OrderRepository::new(state.pool())
        .list_for_user(target)
        .await?;

    Ok(Json(orders))
}

/// `PUT /orders/{id}/pay` - record payment, exactly once (owner or admin).
#[instrument(skip(state, auth, body), fields(user = %auth.0.id))]
pub async fn mark_paid(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
    Json(body): Json<PayRequest>,
) -> Result<Json<Order>> {
    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get(OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_string()))?;

    ensure_can_view(&auth.0, &order)?;

    let order = repo
        .mark_paid(order.id, &PaymentResult::completed(body.payment_reference))
        .await?;

    Ok(Json(order))
}

/// `PUT /orders/{id}/deliver` - record delivery, exactly once (admin only).
#[instrument(skip(state, admin), fields(admin = %admin.0.id))]
pub async fn mark_delivered(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .mark_delivered(OrderId::new(id))
        .await?;

    Ok(Json(order))
}

fn ensure_can_view(user: &User, order: &Order) -> Result<()> {
    if order.user_id != user.id && !user.is_admin {
        return Err(AppError::Forbidden(
            "order belongs to another user".to_string(),
        ));
    }
    Ok(())
}
