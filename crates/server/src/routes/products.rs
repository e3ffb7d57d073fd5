//! Catalog route handlers.

use axum::http::StatusCode;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use luxemarket_core::ProductId;

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{NewProduct, Product};
use crate::state::AppState;

/// Review submission body.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub rating: i16,
    pub comment: String,
}

/// `GET /products` - list the catalog.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// `GET /products/{id}` - product detail with reviews.
#[instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("product not found".to_string()))?;

    Ok(Json(product))
}

/// `POST /products` - create a product (admin).
#[instrument(skip(state, admin, body), fields(admin = %admin.0.id))]
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("product name is required".to_string()));
    }
    if body.count_in_stock < 0 {
        return Err(AppError::BadRequest(
            "stock count cannot be negative".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool()).create(&body).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// `DELETE /products/{id}` - delete a product (admin).
#[instrument(skip(state, admin), fields(admin = %admin.0.id))]
pub async fn delete(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let deleted = ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?;

    if !deleted {
        return Err(AppError::NotFound("product not found".to_string()));
    }

    Ok(Json(json!({ "message": "Product deleted" })))
}

/// `POST /products/{id}/reviews` - add a review and refresh the aggregate.
#[instrument(skip(state, auth, body), fields(user = %auth.0.id))]
pub async fn add_review(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<i64>,
    Json(body): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let user = auth.0;
    let product = ProductRepository::new(state.pool())
        .add_review(
            ProductId::new(id),
            user.id,
            &user.name,
            body.rating,
            &body.comment,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}
