//! Seed the catalog with sample products for local development.
//!
//! # Usage
//!
//! ```bash
//! luxemarket-cli seed products
//! ```
//!
//! Skips seeding when the catalog already has rows, so the command is safe
//! to re-run.

use rust_decimal::Decimal;

use super::{CommandError, connect};

struct SampleProduct {
    name: &'static str,
    price: Decimal,
    category: &'static str,
    description: &'static str,
    image: &'static str,
    count_in_stock: i32,
}

fn sample_products() -> Vec<SampleProduct> {
    vec![
        SampleProduct {
            name: "Leather Weekender Bag",
            price: Decimal::new(24900, 2),
            category: "Accessories",
            description: "Full-grain leather duffel with brass hardware and a detachable shoulder strap.",
            image: "/images/leather-weekender.jpg",
            count_in_stock: 12,
        },
        SampleProduct {
            name: "Cashmere Crewneck Sweater",
            price: Decimal::new(18500, 2),
            category: "Apparel",
            description: "Two-ply Mongolian cashmere in a relaxed fit. Dry clean only.",
            image: "/images/cashmere-crewneck.jpg",
            count_in_stock: 30,
        },
        SampleProduct {
            name: "Automatic Dress Watch",
            price: Decimal::new(74900, 2),
            category: "Watches",
            description: "38mm stainless case, sapphire crystal, exhibition caseback.",
            image: "/images/dress-watch.jpg",
            count_in_stock: 5,
        },
        SampleProduct {
            name: "Silk Twill Scarf",
            price: Decimal::new(9500, 2),
            category: "Accessories",
            description: "Hand-rolled edges, 90cm square, archival botanical print.",
            image: "/images/silk-scarf.jpg",
            count_in_stock: 48,
        },
        SampleProduct {
            name: "Ceramic Pour-Over Set",
            price: Decimal::new(6800, 2),
            category: "Home",
            description: "Matte-glazed dripper and carafe, fits standard #2 filters.",
            image: "/images/pour-over-set.jpg",
            count_in_stock: 20,
        },
    ]
}

/// Insert sample products into an empty catalog.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn products() -> Result<(), CommandError> {
    let pool = connect().await?;

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;

    if existing > 0 {
        tracing::info!("Catalog already has {existing} products, skipping seed");
        return Ok(());
    }

    let samples = sample_products();
    let count = samples.len();

    for product in samples {
        sqlx::query(
            "INSERT INTO products (name, price, category, description, image, count_in_stock)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(product.name)
        .bind(product.price)
        .bind(product.category)
        .bind(product.description)
        .bind(product.image)
        .bind(product.count_in_stock)
        .execute(&pool)
        .await?;
    }

    tracing::info!("Seeded {count} products");
    Ok(())
}
