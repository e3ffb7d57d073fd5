//! Catalog models: products and their embedded reviews.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use luxemarket_core::{ProductId, ReviewId, UserId};

/// A catalog product with its review aggregate.
///
/// `rating` is the arithmetic mean of all review ratings and `num_reviews`
/// the review count; both are recomputed transactionally on every review
/// insertion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub description: String,
    pub image: String,
    pub count_in_stock: i32,
    pub num_reviews: i32,
    pub rating: f64,
    pub reviews: Vec<Review>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

/// A single product review. At most one per (product, user) pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub name: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a product (admin only).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub description: String,
    pub image: String,
    pub count_in_stock: i32,
}

/// Arithmetic mean of review ratings, `0.0` for an empty slice.
#[must_use]
pub fn average_rating(ratings: &[i16]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)] // Review counts stay far below f64 precision
    let len = ratings.len() as f64;
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    #[allow(clippy::cast_precision_loss)]
    let sum = sum as f64;
    sum / len
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_average_rating_empty() {
        assert_eq!(average_rating(&[]), 0.0);
    }

    #[test]
    fn test_average_rating_single() {
        assert_eq!(average_rating(&[4]), 4.0);
    }

    #[test]
    fn test_average_rating_mean() {
        // (5 + 4 + 2) / 3 = 3.666...
        let avg = average_rating(&[5, 4, 2]);
        assert!((avg - 11.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_rating_matches_count() {
        let ratings = [1, 2, 3, 4, 5];
        assert_eq!(average_rating(&ratings), 3.0);
    }
}
