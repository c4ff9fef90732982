//! Builds the public product view from stored rows.
//!
//! Relations for a page of products are fetched with one `WHERE product_id IN (…)`
//! query per relation and stitched together in memory, so a page costs a fixed
//! number of round trips regardless of its size.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

use crate::auth::user;
use crate::entities::{
    brand, category, product, product_dimension, product_image, product_tag, review, tag,
};
use crate::errors::ServiceError;

/// Reviewer name shown when the author account no longer exists.
pub const UNKNOWN_REVIEWER: &str = "Unknown";

/// Product as returned by every catalog endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i32,
    pub title: String,
    pub description: String,
    /// Category name
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub discount_percentage: Decimal,
    /// Mean review rating, null without reviews
    pub rating: Option<f64>,
    pub stock: i32,
    pub tags: Vec<String>,
    pub brand: Option<String>,
    pub sku: Option<String>,
    pub weight: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<DimensionsView>,
    pub warranty_information: Option<String>,
    pub shipping_information: Option<String>,
    pub availability_status: Option<String>,
    pub reviews: Vec<ReviewView>,
    pub return_policy: Option<String>,
    pub minimum_order_quantity: i32,
    pub meta: MetaView,
    pub images: Vec<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DimensionsView {
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub width: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub height: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub depth: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub rating: i32,
    pub comment: String,
    pub date: DateTime<Utc>,
    pub reviewer_name: String,
    pub reviewer_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetaView {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub barcode: Option<String>,
    pub qr_code: Option<String>,
}

/// Related rows for a set of products, keyed by product id (or FK id for lookups).
#[derive(Debug, Default)]
pub struct ProductRelations {
    categories: HashMap<i32, String>,
    brands: HashMap<i32, String>,
    tags: HashMap<i32, Vec<String>>,
    images: HashMap<i32, Vec<String>>,
    dimensions: HashMap<i32, product_dimension::Model>,
    reviews: HashMap<i32, Vec<(review::Model, Option<user::Model>)>>,
}

impl ProductRelations {
    /// Loads every relation of `products` with one batched query each.
    pub async fn load<C>(db: &C, products: &[product::Model]) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if products.is_empty() {
            return Ok(Self::default());
        }

        let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
        let category_ids: Vec<i32> = distinct(products.iter().map(|p| p.category_id));
        let brand_ids: Vec<i32> = distinct(products.iter().filter_map(|p| p.brand_id));

        let categories = category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let brands = if brand_ids.is_empty() {
            HashMap::new()
        } else {
            brand::Entity::find()
                .filter(brand::Column::Id.is_in(brand_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|b| (b.id, b.name))
                .collect()
        };

        let mut tags: HashMap<i32, Vec<String>> = HashMap::new();
        for (link, tag) in product_tag::Entity::find()
            .filter(product_tag::Column::ProductId.is_in(ids.clone()))
            .find_also_related(tag::Entity)
            .all(db)
            .await?
        {
            if let Some(tag) = tag {
                tags.entry(link.product_id).or_default().push(tag.name);
            }
        }
        for names in tags.values_mut() {
            names.sort();
        }

        let mut images: HashMap<i32, Vec<String>> = HashMap::new();
        for image in product_image::Entity::find()
            .filter(product_image::Column::ProductId.is_in(ids.clone()))
            .order_by_asc(product_image::Column::Id)
            .all(db)
            .await?
        {
            images.entry(image.product_id).or_default().push(image.url);
        }

        let dimensions = product_dimension::Entity::find()
            .filter(product_dimension::Column::ProductId.is_in(ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|d| (d.product_id, d))
            .collect();

        let mut reviews: HashMap<i32, Vec<(review::Model, Option<user::Model>)>> = HashMap::new();
        for (row, author) in review::Entity::find()
            .filter(review::Column::ProductId.is_in(ids))
            .order_by_asc(review::Column::Id)
            .find_also_related(user::Entity)
            .all(db)
            .await?
        {
            reviews.entry(row.product_id).or_default().push((row, author));
        }

        Ok(Self {
            categories,
            brands,
            tags,
            images,
            dimensions,
            reviews,
        })
    }
}

fn distinct(ids: impl Iterator<Item = i32>) -> Vec<i32> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

/// Arithmetic mean of review ratings; `None` when there are none.
pub fn rating_mean(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    Some(sum as f64 / ratings.len() as f64)
}

impl ProductView {
    pub fn assemble(product: product::Model, relations: &ProductRelations) -> Self {
        let reviews: Vec<ReviewView> = relations
            .reviews
            .get(&product.id)
            .map(|rows| {
                rows.iter()
                    .map(|(row, author)| ReviewView {
                        rating: row.rating,
                        comment: row.comment.clone(),
                        date: row.created_at,
                        reviewer_name: author
                            .as_ref()
                            .map(|a| a.name.clone())
                            .unwrap_or_else(|| UNKNOWN_REVIEWER.to_string()),
                        reviewer_email: author.as_ref().map(|a| a.email.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();

        Self {
            id: product.id,
            title: product.title,
            description: product.description,
            category: relations
                .categories
                .get(&product.category_id)
                .cloned()
                .unwrap_or_default(),
            price: product.price,
            discount_percentage: product.discount_percentage,
            rating: rating_mean(&ratings),
            stock: product.stock,
            tags: relations.tags.get(&product.id).cloned().unwrap_or_default(),
            brand: product
                .brand_id
                .and_then(|id| relations.brands.get(&id).cloned()),
            sku: product.sku,
            weight: product.weight,
            dimensions: relations.dimensions.get(&product.id).map(|d| DimensionsView {
                width: d.width,
                height: d.height,
                depth: d.depth,
            }),
            warranty_information: product.warranty_information,
            shipping_information: product.shipping_information,
            availability_status: product.availability_status,
            reviews,
            return_policy: product.return_policy,
            minimum_order_quantity: product.minimum_order_quantity,
            meta: MetaView {
                created_at: product.created_at,
                updated_at: product.updated_at,
                barcode: product.barcode,
                qr_code: product.qr_code,
            },
            images: relations.images.get(&product.id).cloned().unwrap_or_default(),
            thumbnail: product.thumbnail,
        }
    }
}

/// Loads relations for `products` and assembles them in their original order.
pub async fn assemble_all<C>(
    db: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductView>, ServiceError>
where
    C: ConnectionTrait,
{
    let relations = ProductRelations::load(db, &products).await?;
    Ok(products
        .into_iter()
        .map(|p| ProductView::assemble(p, &relations))
        .collect())
}

/// Serializes a view, keeping only the `select`ed keys when a projection is given.
pub fn project(
    view: &ProductView,
    select: Option<&[String]>,
) -> Result<serde_json::Value, ServiceError> {
    let value = serde_json::to_value(view)
        .map_err(|e| ServiceError::InternalError(format!("failed to serialize product: {e}")))?;

    let Some(fields) = select else {
        return Ok(value);
    };

    match value {
        serde_json::Value::Object(mut map) => {
            map.retain(|key, _| fields.iter().any(|f| f == key));
            Ok(serde_json::Value::Object(map))
        }
        other => Ok(other),
    }
}
