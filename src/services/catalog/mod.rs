//! Product catalog: listing, search, category scoping and product mutations.

pub mod assembler;
pub mod mutation;
pub mod normalize;
pub mod query;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{category, product, product_dimension, product_image, product_tag, review};
use crate::errors::{FieldErrors, ServiceError};

pub use assembler::{DimensionsView, MetaView, ProductView, ReviewView};
pub use mutation::{
    CreateProductRequest, DeletionReceipt, DimensionsInput, Payload, UpdateProductRequest,
};
pub use query::{ListParams, ListQuery, SearchParams, SortField, SortOrder};

/// One page of products
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    /// Product views, projected to the `select`ed fields when requested
    #[schema(value_type = Vec<ProductView>)]
    pub products: Vec<serde_json::Value>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

impl ProductPage {
    pub fn empty() -> Self {
        Self {
            products: Vec::new(),
            total: 0,
            skip: 0,
            limit: 0,
        }
    }
}

/// Category entry of `GET /products/categories`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategorySummary {
    pub slug: String,
    pub name: String,
    pub url: String,
}

impl From<category::Model> for CategorySummary {
    fn from(model: category::Model) -> Self {
        Self {
            url: format!("/products/category/{}", model.slug),
            slug: model.slug,
            name: model.name,
        }
    }
}

/// Product catalog service
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists every product.
    #[instrument(skip(self))]
    pub async fn list_products(&self, params: &ListParams) -> Result<ProductPage, ServiceError> {
        let query = params.parse()?;
        self.page(query::all_products(), &query).await
    }

    /// Full-text-ish search; a blank term yields an empty page.
    #[instrument(skip(self))]
    pub async fn search_products(&self, params: &SearchParams) -> Result<ProductPage, ServiceError> {
        let query = params.list().parse()?;
        let Some(term) = params.term() else {
            return Ok(ProductPage::empty());
        };
        self.page(query::search_condition(term), &query).await
    }

    /// Lists the products of the category with this slug.
    #[instrument(skip(self))]
    pub async fn products_by_category(
        &self,
        slug: &str,
        params: &ListParams,
    ) -> Result<ProductPage, ServiceError> {
        let query = params.parse()?;
        let category = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", slug))?;

        self.page(query::category_condition(category.id), &query)
            .await
    }

    async fn page(&self, condition: Condition, query: &ListQuery) -> Result<ProductPage, ServiceError> {
        let total = query::products_matching(condition.clone())
            .count(&*self.db)
            .await?;

        let rows = query
            .apply_order(query::products_matching(condition))
            .offset(query.skip)
            .limit(query.limit)
            .all(&*self.db)
            .await?;

        let views = assembler::assemble_all(&*self.db, rows).await?;
        let products = views
            .iter()
            .map(|view| assembler::project(view, query.select.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(total, returned = products.len(), "product page assembled");
        Ok(ProductPage {
            products,
            total,
            skip: query.skip,
            limit: query.limit,
        })
    }

    /// Single product view.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> Result<ProductView, ServiceError> {
        self.load_view(&*self.db, id).await
    }

    async fn load_view<C: ConnectionTrait>(&self, db: &C, id: i32) -> Result<ProductView, ServiceError> {
        let row = product::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;

        let mut views = assembler::assemble_all(db, vec![row]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    /// Categories ordered by name.
    pub async fn categories(&self) -> Result<Vec<CategorySummary>, ServiceError> {
        let rows = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(CategorySummary::from).collect())
    }

    /// Category slugs ordered by category name.
    pub async fn category_slugs(&self) -> Result<Vec<String>, ServiceError> {
        let rows = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(rows.into_iter().map(|c| c.slug).collect())
    }

    /// Creates a product together with its images, tags and dimensions.
    #[instrument(skip_all)]
    pub async fn create_product(
        &self,
        payload: impl Into<Payload<CreateProductRequest>>,
    ) -> Result<ProductView, ServiceError> {
        let Payload {
            request,
            type_errors,
        } = payload.into();
        debug!(title = ?request.title, "creating product");

        let mut errors = type_errors;
        errors.extend_unreported(request.validate());
        errors.into_result()?;

        let (Some(title), Some(description), Some(category_name), Some(price), Some(stock)) = (
            request.title,
            request.description,
            request.category,
            request.price,
            request.stock,
        ) else {
            return Err(ServiceError::InvalidInput(
                "title, description, category, price and stock are required".to_string(),
            ));
        };

        let sku = trimmed(request.sku);
        let txn = self.db.begin().await?;

        if let Some(sku) = &sku {
            ensure_unique_sku(&txn, sku, None).await?;
        }

        let category = mutation::resolve_category(&txn, &category_name).await?;
        let brand_id = match trimmed(request.brand) {
            Some(name) => Some(mutation::resolve_brand(&txn, &name).await?.id),
            None => None,
        };

        let now = Utc::now();
        let created = product::ActiveModel {
            title: Set(title.trim().to_string()),
            description: Set(description),
            category_id: Set(category.id),
            brand_id: Set(brand_id),
            price: Set(price),
            discount_percentage: Set(request.discount_percentage.unwrap_or_default()),
            rating: Set(request.rating.unwrap_or_default()),
            stock: Set(stock),
            sku: Set(sku),
            weight: Set(request.weight),
            warranty_information: Set(request.warranty_information),
            shipping_information: Set(request.shipping_information),
            availability_status: Set(request.availability_status),
            return_policy: Set(request.return_policy),
            minimum_order_quantity: Set(request.minimum_order_quantity.unwrap_or(1)),
            barcode: Set(request.barcode),
            qr_code: Set(request.qr_code),
            thumbnail: Set(request.thumbnail),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(write_error)?;

        if let Some(images) = request.images {
            replace_images(&txn, created.id, &images).await?;
        }
        if let Some(tags) = request.tags {
            replace_tags(&txn, created.id, &tags).await?;
        }
        if let Some(dimensions) = request.dimensions {
            upsert_dimensions(&txn, created.id, dimensions).await?;
        }

        txn.commit().await?;
        info!(product_id = created.id, "product created");

        self.get_product(created.id).await
    }

    /// Applies a partial update; images and tags are replaced wholesale when supplied.
    #[instrument(skip(self, payload))]
    pub async fn update_product(
        &self,
        id: i32,
        payload: impl Into<Payload<UpdateProductRequest>>,
    ) -> Result<ProductView, ServiceError> {
        let Payload {
            request,
            type_errors,
        } = payload.into();

        let txn = self.db.begin().await?;

        let mut errors = type_errors;
        errors.extend_unreported(request.validate());
        if let (None, Some(category_id)) = (request.category.as_deref(), request.category_id) {
            if category::Entity::find_by_id(category_id).one(&txn).await?.is_none() {
                errors.push(
                    "category_id",
                    "exists",
                    "The selected category id is invalid.",
                );
            }
        }
        errors.into_result()?;

        let existing = product::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;

        let category_id = match (request.category.as_deref(), request.category_id) {
            (Some(name), _) => Some(mutation::resolve_category(&txn, name).await?.id),
            (None, category_id) => category_id,
        };

        let mut active = existing.into_active_model();

        if let Some(title) = request.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = request.description {
            active.description = Set(description);
        }
        if let Some(category_id) = category_id {
            active.category_id = Set(category_id);
        }
        if let Some(brand) = request.brand {
            active.brand_id = match trimmed(Some(brand)) {
                Some(name) => Set(Some(mutation::resolve_brand(&txn, &name).await?.id)),
                None => Set(None),
            };
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(discount) = request.discount_percentage {
            active.discount_percentage = Set(discount);
        }
        if let Some(rating) = request.rating {
            active.rating = Set(rating);
        }
        if let Some(stock) = request.stock {
            active.stock = Set(stock);
        }
        if let Some(sku) = request.sku {
            let sku = trimmed(Some(sku));
            if let Some(sku) = &sku {
                ensure_unique_sku(&txn, sku, Some(id)).await?;
            }
            active.sku = Set(sku);
        }
        if let Some(weight) = request.weight {
            active.weight = Set(Some(weight));
        }
        if let Some(value) = request.warranty_information {
            active.warranty_information = Set(Some(value));
        }
        if let Some(value) = request.shipping_information {
            active.shipping_information = Set(Some(value));
        }
        if let Some(value) = request.availability_status {
            active.availability_status = Set(Some(value));
        }
        if let Some(value) = request.return_policy {
            active.return_policy = Set(Some(value));
        }
        if let Some(value) = request.minimum_order_quantity {
            active.minimum_order_quantity = Set(value);
        }
        if let Some(value) = request.barcode {
            active.barcode = Set(Some(value));
        }
        if let Some(value) = request.qr_code {
            active.qr_code = Set(Some(value));
        }
        if let Some(value) = request.thumbnail {
            active.thumbnail = Set(Some(value));
        }
        active.updated_at = Set(Utc::now());

        active.update(&txn).await.map_err(write_error)?;

        if let Some(images) = request.images {
            replace_images(&txn, id, &images).await?;
        }
        if let Some(tags) = request.tags {
            replace_tags(&txn, id, &tags).await?;
        }
        if let Some(dimensions) = request.dimensions {
            upsert_dimensions(&txn, id, dimensions).await?;
        }

        txn.commit().await?;
        info!(product_id = id, "product updated");

        self.get_product(id).await
    }

    /// Removes a product; images, dimensions and reviews go with it via FK cascade.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<DeletionReceipt, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = product::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;

        product_tag::Entity::delete_many()
            .filter(product_tag::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        product::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!(product_id = id, "product deleted");

        Ok(DeletionReceipt {
            id: existing.id,
            title: existing.title,
            is_deleted: true,
            deleted_on: Utc::now(),
        })
    }

    /// Records a review; `user_id` may be absent for anonymous imports.
    #[instrument(skip(self, comment))]
    pub async fn add_review(
        &self,
        product_id: i32,
        user_id: Option<Uuid>,
        rating: i32,
        comment: &str,
    ) -> Result<review::Model, ServiceError> {
        if !(1..=5).contains(&rating) {
            return Err(ServiceError::ValidationFailed(FieldErrors::single(
                "rating",
                "range",
                "rating must be between 1 and 5",
            )));
        }

        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        let created = review::ActiveModel {
            product_id: Set(product_id),
            user_id: Set(user_id),
            rating: Set(rating),
            comment: Set(comment.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        debug!(product_id, review_id = created.id, "review recorded");
        Ok(created)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn duplicate_sku() -> ServiceError {
    ServiceError::Conflict("A product with this SKU already exists".to_string())
}

/// Unique-index violations on product writes can only come from the SKU.
fn write_error(err: DbErr) -> ServiceError {
    if crate::auth::is_unique_violation(&err) {
        duplicate_sku()
    } else {
        ServiceError::DatabaseError(err)
    }
}

async fn ensure_unique_sku<C: ConnectionTrait>(
    db: &C,
    sku: &str,
    except: Option<i32>,
) -> Result<(), ServiceError> {
    let mut finder = product::Entity::find().filter(product::Column::Sku.eq(sku));
    if let Some(id) = except {
        finder = finder.filter(product::Column::Id.ne(id));
    }
    if finder.one(db).await?.is_some() {
        return Err(duplicate_sku());
    }
    Ok(())
}

async fn replace_images<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    urls: &[String],
) -> Result<(), DbErr> {
    product_image::Entity::delete_many()
        .filter(product_image::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;

    if urls.is_empty() {
        return Ok(());
    }

    product_image::Entity::insert_many(urls.iter().map(|url| product_image::ActiveModel {
        product_id: Set(product_id),
        url: Set(url.clone()),
        ..Default::default()
    }))
    .exec(db)
    .await?;
    Ok(())
}

async fn replace_tags<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    names: &[String],
) -> Result<(), DbErr> {
    product_tag::Entity::delete_many()
        .filter(product_tag::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;

    let tag_ids = mutation::resolve_tags(db, names).await?;
    if tag_ids.is_empty() {
        return Ok(());
    }

    product_tag::Entity::insert_many(tag_ids.into_iter().map(|tag_id| product_tag::ActiveModel {
        product_id: Set(product_id),
        tag_id: Set(tag_id),
    }))
    .exec_without_returning(db)
    .await?;
    Ok(())
}

async fn upsert_dimensions<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    input: DimensionsInput,
) -> Result<(), DbErr> {
    let existing = product_dimension::Entity::find()
        .filter(product_dimension::Column::ProductId.eq(product_id))
        .one(db)
        .await?;

    match existing {
        Some(row) => {
            let mut active = row.into_active_model();
            if input.width.is_some() {
                active.width = Set(input.width);
            }
            if input.height.is_some() {
                active.height = Set(input.height);
            }
            if input.depth.is_some() {
                active.depth = Set(input.depth);
            }
            active.update(db).await?;
        }
        None => {
            product_dimension::ActiveModel {
                product_id: Set(product_id),
                width: Set(input.width),
                height: Set(input.height),
                depth: Set(input.depth),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}
