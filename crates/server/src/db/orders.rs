//! Order ledger repository.
//!
//! Orders and their line items are written in one transaction at checkout
//! and never structurally mutated afterwards. The only updates are
//! [`OrderRepository::mark_paid`] and [`OrderRepository::mark_delivered`],
//! each guarded so the flag flips at most once.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;

use luxemarket_core::{OrderId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderItem, PaymentResult, ShippingAddress};

const ORDER_COLUMNS: &str = "id, user_id, shipping_address, payment_method, items_price, \
     tax_price, shipping_price, total_price, is_paid, paid_at, payment_result, \
     is_delivered, delivered_at, created_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    shipping_address: Value,
    payment_method: String,
    items_price: Decimal,
    tax_price: Decimal,
    shipping_price: Decimal,
    total_price: Decimal,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    payment_result: Option<Value>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, order_items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let shipping_address: ShippingAddress = serde_json::from_value(self.shipping_address)
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid shipping address: {e}"))
            })?;
        let payment_result: Option<PaymentResult> = self
            .payment_result
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid payment result: {e}")))?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            order_items,
            shipping_address,
            payment_method: self.payment_method,
            items_price: self.items_price,
            tax_price: self.tax_price,
            shipping_price: self.shipping_price,
            total_price: self.total_price,
            is_paid: self.is_paid,
            paid_at: self.paid_at,
            payment_result,
            is_delivered: self.is_delivered,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: i64,
    product_id: i64,
    name: String,
    quantity: i32,
    unit_price: Decimal,
    image: String,
}

impl From<OrderItemRow> for OrderItem {
    fn from(r: OrderItemRow) -> Self {
        Self {
            product_id: ProductId::new(r.product_id),
            name: r.name,
            quantity: r.quantity,
            unit_price: r.unit_price,
            image: r.image,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order with its line items in one transaction.
    ///
    /// Callers must reject empty carts before reaching here; a `NewOrder`
    /// with a `payment_result` is written already paid.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn create(&self, user_id: UserId, new: &NewOrder) -> Result<Order, RepositoryError> {
        let shipping_address = serde_json::to_value(&new.shipping_address)
            .map_err(|e| RepositoryError::DataCorruption(format!("shipping address: {e}")))?;
        let payment_result = new
            .payment_result
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("payment result: {e}")))?;
        let paid_at = new.payment_result.as_ref().map(|_| Utc::now());

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (user_id, shipping_address, payment_method, items_price,
                                 tax_price, shipping_price, total_price, is_paid, paid_at,
                                 payment_result)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id.as_i64())
        .bind(shipping_address)
        .bind(&new.payment_method)
        .bind(new.items_price)
        .bind(new.tax_price)
        .bind(new.shipping_price)
        .bind(new.total_price)
        .bind(new.payment_result.is_some())
        .bind(paid_at)
        .bind(payment_result)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new.order_items.len());
        for item in &new.order_items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, name, quantity, unit_price, image)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(row.id)
            .bind(item.product_id.as_i64())
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(&item.image)
            .execute(&mut *tx)
            .await?;

            items.push(OrderItem {
                product_id: item.product_id,
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                image: item.image.clone(),
            });
        }

        tx.commit().await?;

        row.into_order(items)
    }

    /// Get an order with its line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_id, product_id, name, quantity, unit_price, image
             FROM order_items WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(id.as_i64())
        .fetch_all(self.pool)
        .await?;

        Ok(Some(
            row.into_order(items.into_iter().map(OrderItem::from).collect())?,
        ))
    }

    /// List a user's orders, newest first, with line items attached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        let order_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_id, product_id, name, quantity, unit_price, image
             FROM order_items WHERE order_id = ANY($1) ORDER BY id ASC",
        )
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = item_rows
                .iter()
                .filter(|i| i.order_id == row.id)
                .map(|i| OrderItem {
                    product_id: ProductId::new(i.product_id),
                    name: i.name.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                    image: i.image.clone(),
                })
                .collect();
            orders.push(row.into_order(items)?);
        }

        Ok(orders)
    }

    /// Record payment on an order, exactly once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if the order is already paid.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_paid(
        &self,
        id: OrderId,
        result: &PaymentResult,
    ) -> Result<Order, RepositoryError> {
        let payment_result = serde_json::to_value(result)
            .map_err(|e| RepositoryError::DataCorruption(format!("payment result: {e}")))?;

        let updated = sqlx::query(
            "UPDATE orders SET is_paid = TRUE, paid_at = NOW(), payment_result = $1
             WHERE id = $2 AND is_paid = FALSE",
        )
        .bind(payment_result)
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return match self.get(id).await? {
                Some(_) => Err(RepositoryError::Conflict("order already paid".to_owned())),
                None => Err(RepositoryError::NotFound),
            };
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Record delivery on an order, exactly once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if the order is already delivered.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn mark_delivered(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE orders SET is_delivered = TRUE, delivered_at = NOW()
             WHERE id = $1 AND is_delivered = FALSE",
        )
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return match self.get(id).await? {
                Some(_) => Err(RepositoryError::Conflict(
                    "order already delivered".to_owned(),
                )),
                None => Err(RepositoryError::NotFound),
            };
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }
}
