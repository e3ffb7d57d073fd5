//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database ping)
//!
//! # Auth (rate limited)
//! POST /auth/signup               - Register, dispatch verification code
//! POST /auth/verify               - Confirm code, log in
//! POST /auth/resend-otp           - Issue a fresh code
//! POST /auth/login                - Password login
//!
//! # Catalog
//! GET  /products                  - Product listing
//! GET  /products/{id}             - Product detail with reviews
//! POST /products                  - Create product (admin)
//! DELETE /products/{id}           - Delete product (admin)
//! POST /products/{id}/reviews     - Add review (auth, one per user)
//!
//! # Orders (auth)
//! POST /orders                    - Create order
//! GET  /orders/{id}               - Order detail (owner or admin)
//! GET  /orders/myorders/{user_id} - Order history (owner or admin)
//! PUT  /orders/{id}/pay           - Mark paid, exactly once
//! PUT  /orders/{id}/deliver       - Mark delivered, exactly once (admin)
//!
//! # Payment (auth)
//! POST /payment/create-order      - Open a gateway order
//! POST /payment/verify            - Verify confirmation signature, settle
//! ```

pub mod auth;
pub mod orders;
pub mod payment;
pub mod products;

use axum::http::StatusCode;
use axum::{
    Json,
    Router,
    extract::State,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/verify", post(auth::verify))
        .route("/resend-otp", post(auth::resend_otp))
        .route("/login", post(auth::login))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/{id}", get(products::get).delete(products::delete))
        .route("/{id}/reviews", post(products::add_review))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/{id}", get(orders::get))
        .route("/myorders/{user_id}", get(orders::list_for_user))
        .route("/{id}/pay", put(orders::mark_paid))
        .route("/{id}/deliver", put(orders::mark_delivered))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-order", post(payment::create_gateway_order))
        .route("/verify", post(payment::verify))
}

/// Liveness check.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check: pings the database.
pub async fn health_ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::error!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
        }
    }
}
