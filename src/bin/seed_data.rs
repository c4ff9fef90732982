//! Seed data script - populates the database with demo catalog data
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 3 demo users (password: `password123`)
//! - 20 products spread over 5 categories and 4 brands
//! - 2 images, 3 tags, dimensions and 5 reviews per product

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use catalog_api::{
    auth::{hash_password, user},
    db,
    services::catalog::{CatalogService, CreateProductRequest, DimensionsInput},
};

const CATEGORIES: &[&str] = &["smartphones", "laptops", "fragrances", "skin care", "home decoration"];
const BRANDS: &[&str] = &["Apple", "Samsung", "Essence", "Glamour Beauty"];
const ADJECTIVES: &[&str] = &["Classic", "Compact", "Deluxe", "Everyday", "Premium"];
const TAGS: &[&str] = &[
    "new", "sale", "bestseller", "eco", "limited", "gift", "travel", "premium", "budget",
];
const COMMENTS: &[&str] = &[
    "Great product!",
    "Would buy again.",
    "Not as described.",
    "Very satisfied.",
    "Fast shipping, works fine.",
];
const DEMO_PASSWORD: &str = "password123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== Catalog API Seed Data ===");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://catalog.db?mode=rwc".to_string());

    info!("Connecting to database: {}", database_url);
    let conn = db::establish_connection(&database_url).await?;
    db::run_migrations(&conn).await?;
    let conn = Arc::new(conn);

    info!("Creating users...");
    let users = create_users(&conn).await?;
    info!("  {} users available", users.len());

    info!("Creating products...");
    let catalog = CatalogService::new(conn.clone());
    let created = create_products(&catalog, &users).await?;
    info!("  Created {} products with images, tags, dimensions and reviews", created);

    info!("=== Seed Data Complete ===");
    info!("Try: curl http://localhost:8080/products?limit=5");
    info!("Log in with demo1@example.com / {}", DEMO_PASSWORD);

    Ok(())
}

async fn create_users(db: &DatabaseConnection) -> anyhow::Result<Vec<Uuid>> {
    let password_hash =
        hash_password(DEMO_PASSWORD).map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;
    let mut ids = Vec::new();

    for n in 1..=3 {
        let email = format!("demo{n}@example.com");
        if let Some(existing) = user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(db)
            .await?
        {
            ids.push(existing.id);
            continue;
        }

        let now = Utc::now();
        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(format!("Demo User {n}")),
            email: Set(email),
            password_hash: Set(password_hash.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;
        ids.push(created.id);
    }

    Ok(ids)
}

async fn create_products(catalog: &CatalogService, users: &[Uuid]) -> anyhow::Result<usize> {
    let run = Utc::now().timestamp();
    let mut created = 0;

    for i in 0..20usize {
        let category = CATEGORIES[i % CATEGORIES.len()];
        let request = CreateProductRequest {
            title: Some(format!("{} {} {}", ADJECTIVES[i % ADJECTIVES.len()], category, i + 1)),
            description: Some(format!(
                "A {} from our {} range, picked for everyday use.",
                ADJECTIVES[(i + 2) % ADJECTIVES.len()].to_lowercase(),
                category
            )),
            category: Some(category.to_string()),
            brand: Some(BRANDS[i % BRANDS.len()].to_string()),
            price: Some(Decimal::from(10 + (i as i64 * 47) % 990) + dec!(0.99)),
            discount_percentage: Some(Decimal::from((i as i64 * 7) % 30)),
            stock: Some(((i * 13) % 100 + 1) as i32),
            sku: Some(format!("PRD-{run}-{:04}", i + 1)),
            weight: Some((i % 5 + 1) as i32),
            dimensions: Some(DimensionsInput {
                width: Some(Decimal::from(5 + i as i64) + dec!(0.5)),
                height: Some(Decimal::from(10 + i as i64)),
                depth: Some(dec!(2.25)),
            }),
            warranty_information: Some("1 year warranty".to_string()),
            shipping_information: Some("Ships in 3-5 business days".to_string()),
            availability_status: Some("In Stock".to_string()),
            return_policy: Some("30 days return policy".to_string()),
            minimum_order_quantity: Some(1),
            thumbnail: Some(format!("https://cdn.example.com/products/{}/thumbnail.png", i + 1)),
            images: Some(vec![
                format!("https://cdn.example.com/products/{}/1.png", i + 1),
                format!("https://cdn.example.com/products/{}/2.png", i + 1),
            ]),
            tags: Some(
                (0..3)
                    .map(|k| TAGS[(i + k * 3) % TAGS.len()].to_string())
                    .collect(),
            ),
            ..Default::default()
        };

        let product = catalog.create_product(request).await?;

        for r in 0..5usize {
            let author = users.get((i + r) % users.len().max(1)).copied();
            let rating = ((i + r) % 5 + 1) as i32;
            catalog
                .add_review(product.id, author, rating, COMMENTS[r % COMMENTS.len()])
                .await?;
        }
        created += 1;
    }

    Ok(created)
}
