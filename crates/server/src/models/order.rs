//! Order ledger models.
//!
//! Orders are append-only: created once per checkout attempt, `is_paid` set
//! exactly once by the payment confirmation workflow, `is_delivered` set
//! exactly once by an admin action. No other mutation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use luxemarket_core::{OrderId, ProductId, UserId};

/// An order record tied to a user and a cart snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_result: Option<PaymentResult>,
    pub is_delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A single ordered line item (cart snapshot at checkout time).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub image: String,
}

/// Shipping destination captured at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Gateway transaction reference recorded when an order is paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub id: String,
    pub status: String,
}

impl PaymentResult {
    /// Payment result for a verified gateway payment.
    #[must_use]
    pub fn completed(reference: impl Into<String>) -> Self {
        Self {
            id: reference.into(),
            status: "COMPLETED".to_string(),
        }
    }
}

/// Payload for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_items: Vec<NewOrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub items_price: Decimal,
    pub tax_price: Decimal,
    pub shipping_price: Decimal,
    pub total_price: Decimal,
    /// When present, the order is created already paid (checkout finished
    /// through the payment confirmation workflow).
    pub payment_result: Option<PaymentResult>,
}

/// A line item within a [`NewOrder`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub image: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_result_completed() {
        let result = PaymentResult::completed("pay_123");
        assert_eq!(result.id, "pay_123");
        assert_eq!(result.status, "COMPLETED");
    }

    #[test]
    fn test_shipping_address_camel_case() {
        let addr: ShippingAddress = serde_json::from_str(
            r#"{"address":"1 Main St","city":"Springfield","postalCode":"12345","country":"US"}"#,
        )
        .unwrap();
        assert_eq!(addr.postal_code, "12345");
    }
}
