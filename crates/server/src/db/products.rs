//! Product repository: catalog CRUD and the review aggregation rule.
//!
//! Review insertion and the `rating`/`num_reviews` recompute happen in one
//! transaction. The one-review-per-user rule is backed by a
//! `UNIQUE (product_id, user_id)` constraint, so two racing first reviews
//! serialize in the database and the loser gets a `Conflict`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use luxemarket_core::{ProductId, ReviewId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::product::average_rating;
use crate::models::{NewProduct, Product, Review};

const PRODUCT_COLUMNS: &str =
    "id, name, price, category, description, image, count_in_stock, num_reviews, rating, created_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: Decimal,
    category: String,
    description: String,
    image: String,
    count_in_stock: i32,
    num_reviews: i32,
    rating: f64,
    created_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, reviews: Vec<Review>) -> Product {
        Product {
            id: ProductId::new(self.id),
            name: self.name,
            price: self.price,
            category: self.category,
            description: self.description,
            image: self.image,
            count_in_stock: self.count_in_stock,
            num_reviews: self.num_reviews,
            rating: self.rating,
            reviews,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    user_id: i64,
    name: String,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(r: ReviewRow) -> Self {
        Self {
            id: ReviewId::new(r.id),
            user_id: UserId::new(r.user_id),
            name: r.name,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at,
        }
    }
}

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products, newest first. Reviews are not loaded here; use
    /// [`ProductRepository::get`] for the detail view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| r.into_product(Vec::new()))
            .collect())
    }

    /// Get a product with its reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let reviews = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, user_id, name, rating, comment, created_at
             FROM reviews WHERE product_id = $1 ORDER BY created_at ASC",
        )
        .bind(id.as_i64())
        .fetch_all(self.pool)
        .await?;

        Ok(Some(
            row.into_product(reviews.into_iter().map(Review::from).collect()),
        ))
    }

    /// Create a new product (admin action).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (name, price, category, description, image, count_in_stock)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.price)
        .bind(&new.category)
        .bind(&new.description)
        .bind(&new.image)
        .bind(new.count_in_stock)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_product(Vec::new()))
    }

    /// Delete a product (admin action).
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert a review and recompute the product's rating aggregate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if this user already reviewed it.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add_review(
        &self,
        product_id: ProductId,
        user_id: UserId,
        reviewer_name: &str,
        rating: i16,
        comment: &str,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM products WHERE id = $1")
            .bind(product_id.as_i64())
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "INSERT INTO reviews (product_id, user_id, name, rating, comment)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(product_id.as_i64())
        .bind(user_id.as_i64())
        .bind(reviewer_name)
        .bind(rating)
        .bind(comment)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "product already reviewed"))?;

        let ratings = sqlx::query_scalar::<_, i16>(
            "SELECT rating FROM reviews WHERE product_id = $1",
        )
        .bind(product_id.as_i64())
        .fetch_all(&mut *tx)
        .await?;

        let num_reviews = i32::try_from(ratings.len()).unwrap_or(i32::MAX);
        let rating_mean = average_rating(&ratings);

        sqlx::query("UPDATE products SET num_reviews = $1, rating = $2 WHERE id = $3")
            .bind(num_reviews)
            .bind(rating_mean)
            .bind(product_id.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get(product_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
