//! Write-side inputs for products and the lookup-row resolution they need.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::OnConflict, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::normalize::{slugify, title_case};
use crate::entities::{brand, category, tag};
use crate::errors::{FieldErrors, ServiceError};

/// Decimal counterpart of `range(min, max)` with whole-number bounds.
fn bounded(min: i64, max: Option<i64>, value: &Decimal) -> Result<(), ValidationError> {
    let too_low = *value < Decimal::from(min);
    let too_high = max.map_or(false, |max| *value > Decimal::from(max));
    if !(too_low || too_high) {
        return Ok(());
    }

    let mut err = ValidationError::new("range");
    err.add_param(Cow::from("min"), &min);
    if let Some(max) = max {
        err.add_param(Cow::from("max"), &max);
    }
    Err(err)
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    bounded(0, None, value)
}

fn percentage(value: &Decimal) -> Result<(), ValidationError> {
    bounded(0, Some(100), value)
}

fn rating_bounds(value: &Decimal) -> Result<(), ValidationError> {
    bounded(0, Some(5), value)
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::from("must not be blank"));
        return Err(err);
    }
    Ok(())
}

/// Category names must be non-blank and produce a usable slug.
fn category_name(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    if slugify(value).is_empty() {
        let mut err = ValidationError::new("slug");
        err.message = Some(Cow::from("must contain at least one letter or digit"));
        return Err(err);
    }
    Ok(())
}

fn image_urls(urls: &[String]) -> Result<(), ValidationError> {
    if urls.iter().all(|u| validator::validate_url(u.as_str())) {
        return Ok(());
    }
    let mut err = ValidationError::new("url");
    err.message = Some(Cow::from("every image must be a valid URL"));
    Err(err)
}

fn tag_names(tags: &[String]) -> Result<(), ValidationError> {
    let ok = tags.iter().all(|t| {
        let len = t.trim().chars().count();
        (1..=100).contains(&len)
    });
    if ok {
        return Ok(());
    }
    let mut err = ValidationError::new("length");
    err.message = Some(Cow::from("every tag must be between 1 and 100 characters"));
    Err(err)
}

/// Physical dimensions as submitted
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct DimensionsInput {
    #[validate(custom = "non_negative")]
    #[schema(value_type = Option<f64>)]
    pub width: Option<Decimal>,
    #[validate(custom = "non_negative")]
    #[schema(value_type = Option<f64>)]
    pub height: Option<Decimal>,
    #[validate(custom = "non_negative")]
    #[schema(value_type = Option<f64>)]
    pub depth: Option<Decimal>,
}

/// Payload for `POST /products/add`
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(required, length(min = 1, max = 255), custom = "not_blank")]
    pub title: Option<String>,

    #[validate(required, custom = "not_blank")]
    pub description: Option<String>,

    /// Category name; created on first use
    #[validate(required, length(max = 255), custom = "category_name")]
    pub category: Option<String>,

    #[validate(required, custom = "non_negative")]
    #[schema(value_type = f64)]
    pub price: Option<Decimal>,

    #[serde(alias = "discountPercentage")]
    #[validate(custom = "percentage")]
    #[schema(value_type = Option<f64>)]
    pub discount_percentage: Option<Decimal>,

    #[validate(custom = "rating_bounds")]
    #[schema(value_type = Option<f64>)]
    pub rating: Option<Decimal>,

    #[validate(required, range(min = 0))]
    pub stock: Option<i32>,

    #[validate(length(max = 255))]
    pub brand: Option<String>,

    #[validate(length(max = 100))]
    pub sku: Option<String>,

    #[validate(range(min = 0))]
    pub weight: Option<i32>,

    #[validate]
    pub dimensions: Option<DimensionsInput>,

    #[serde(alias = "warrantyInformation")]
    #[validate(length(max = 500))]
    pub warranty_information: Option<String>,

    #[serde(alias = "shippingInformation")]
    #[validate(length(max = 500))]
    pub shipping_information: Option<String>,

    #[serde(alias = "availabilityStatus")]
    #[validate(length(max = 100))]
    pub availability_status: Option<String>,

    #[serde(alias = "returnPolicy")]
    #[validate(length(max = 500))]
    pub return_policy: Option<String>,

    #[serde(alias = "minimumOrderQuantity")]
    #[validate(range(min = 1))]
    pub minimum_order_quantity: Option<i32>,

    #[validate(length(max = 100))]
    pub barcode: Option<String>,

    #[serde(alias = "qrCode")]
    #[validate(length(max = 255))]
    pub qr_code: Option<String>,

    #[validate(url)]
    pub thumbnail: Option<String>,

    #[validate(custom = "image_urls")]
    pub images: Option<Vec<String>>,

    #[validate(custom = "tag_names")]
    pub tags: Option<Vec<String>>,
}

/// Payload for `PUT /products/{id}`; only supplied fields change
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255), custom = "not_blank")]
    pub title: Option<String>,

    #[validate(custom = "not_blank")]
    pub description: Option<String>,

    /// Category name; created on first use
    #[validate(length(max = 255), custom = "category_name")]
    pub category: Option<String>,

    /// Existing category id, an alternative to `category`
    #[serde(alias = "categoryId")]
    pub category_id: Option<i32>,

    #[validate(custom = "non_negative")]
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,

    #[serde(alias = "discountPercentage")]
    #[validate(custom = "percentage")]
    #[schema(value_type = Option<f64>)]
    pub discount_percentage: Option<Decimal>,

    #[validate(custom = "rating_bounds")]
    #[schema(value_type = Option<f64>)]
    pub rating: Option<Decimal>,

    #[validate(range(min = 0))]
    pub stock: Option<i32>,

    #[validate(length(max = 255))]
    pub brand: Option<String>,

    #[validate(length(max = 100))]
    pub sku: Option<String>,

    #[validate(range(min = 0))]
    pub weight: Option<i32>,

    #[validate]
    pub dimensions: Option<DimensionsInput>,

    #[serde(alias = "warrantyInformation")]
    #[validate(length(max = 500))]
    pub warranty_information: Option<String>,

    #[serde(alias = "shippingInformation")]
    #[validate(length(max = 500))]
    pub shipping_information: Option<String>,

    #[serde(alias = "availabilityStatus")]
    #[validate(length(max = 100))]
    pub availability_status: Option<String>,

    #[serde(alias = "returnPolicy")]
    #[validate(length(max = 500))]
    pub return_policy: Option<String>,

    #[serde(alias = "minimumOrderQuantity")]
    #[validate(range(min = 1))]
    pub minimum_order_quantity: Option<i32>,

    #[validate(length(max = 100))]
    pub barcode: Option<String>,

    #[serde(alias = "qrCode")]
    #[validate(length(max = 255))]
    pub qr_code: Option<String>,

    #[validate(url)]
    pub thumbnail: Option<String>,

    /// Replaces the whole image set when present
    #[validate(custom = "image_urls")]
    pub images: Option<Vec<String>>,

    /// Replaces every tag association when present; `[]` clears them
    #[validate(custom = "tag_names")]
    pub tags: Option<Vec<String>>,
}

/// A write request plus the fields that were dropped for having the wrong JSON type.
#[derive(Debug, Clone, Default)]
pub struct Payload<T> {
    pub request: T,
    pub type_errors: FieldErrors,
}

impl<T> From<T> for Payload<T> {
    fn from(request: T) -> Self {
        Self {
            request,
            type_errors: FieldErrors::new(),
        }
    }
}

impl<T: DeserializeOwned> Payload<T> {
    /// Decodes a JSON object key by key. A key whose value does not fit its field
    /// is reported with code `type` and left out, so the rest of the body can
    /// still be validated.
    pub fn decode(body: Value) -> Result<Self, ServiceError> {
        let Value::Object(fields) = body else {
            return Err(ServiceError::InvalidInput(
                "request body must be a JSON object".to_string(),
            ));
        };

        let mut type_errors = FieldErrors::new();
        let mut accepted = Map::with_capacity(fields.len());
        for (key, value) in fields {
            let single: Map<String, Value> = std::iter::once((key.clone(), value.clone())).collect();
            match serde_json::from_value::<T>(Value::Object(single)) {
                Ok(_) => {
                    accepted.insert(key, value);
                }
                Err(err) => {
                    let message = format!("{} has the wrong type: {}", key, err);
                    type_errors.push(&key, "type", message);
                }
            }
        }

        let request = serde_json::from_value(Value::Object(accepted))
            .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
        Ok(Self {
            request,
            type_errors,
        })
    }
}

/// Returned by `DELETE /products/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReceipt {
    pub id: i32,
    pub title: String,
    pub is_deleted: bool,
    pub deleted_on: DateTime<Utc>,
}

/// Trims, drops empties and removes duplicates while keeping first-seen order.
pub fn distinct_tag_names(tags: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(tags.len());
    for name in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Finds the category for `name` or creates it.
///
/// The name is title-cased and keyed by its slug; a concurrent insert of the same
/// slug is absorbed by `ON CONFLICT DO NOTHING` and the winner's row is read back.
pub async fn resolve_category<C>(db: &C, name: &str) -> Result<category::Model, DbErr>
where
    C: ConnectionTrait,
{
    let name = title_case(name);
    let slug = slugify(&name);

    category::Entity::insert(category::ActiveModel {
        name: Set(name.clone()),
        slug: Set(slug.clone()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(category::Column::Slug)
            .do_nothing()
            .to_owned(),
    )
    .do_nothing()
    .exec(db)
    .await?;

    category::Entity::find()
        .filter(category::Column::Slug.eq(slug.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("category '{}'", slug)))
}

/// Finds or creates the brand with this exact (trimmed) name.
pub async fn resolve_brand<C>(db: &C, name: &str) -> Result<brand::Model, DbErr>
where
    C: ConnectionTrait,
{
    let name = name.trim().to_string();

    brand::Entity::insert(brand::ActiveModel {
        name: Set(name.clone()),
        ..Default::default()
    })
    .on_conflict(OnConflict::column(brand::Column::Name).do_nothing().to_owned())
    .do_nothing()
    .exec(db)
    .await?;

    brand::Entity::find()
        .filter(brand::Column::Name.eq(name.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("brand '{}'", name)))
}

/// Finds or creates one tag row per distinct name, returning their ids.
pub async fn resolve_tags<C>(db: &C, tags: &[String]) -> Result<Vec<i32>, DbErr>
where
    C: ConnectionTrait,
{
    let names = distinct_tag_names(tags);
    if names.is_empty() {
        return Ok(Vec::new());
    }

    tag::Entity::insert_many(names.iter().map(|name| tag::ActiveModel {
        name: Set(name.clone()),
        ..Default::default()
    }))
    .on_conflict(OnConflict::column(tag::Column::Name).do_nothing().to_owned())
    .do_nothing()
    .exec(db)
    .await?;

    let rows = tag::Entity::find()
        .filter(tag::Column::Name.is_in(names.iter().map(String::as_str)))
        .all(db)
        .await?;

    Ok(rows.into_iter().map(|t| t.id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn valid_create() -> CreateProductRequest {
        CreateProductRequest {
            title: Some("Desk Lamp".into()),
            description: Some("Warm light".into()),
            category: Some("lighting".into()),
            price: Some(dec!(19.5)),
            stock: Some(4),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_create_payload_is_valid() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let errors: FieldErrors = CreateProductRequest::default()
            .validate()
            .unwrap_err()
            .into();

        for field in ["title", "description", "category", "price", "stock"] {
            assert!(errors.contains_field(field), "expected error on {field}");
        }
    }

    #[test]
    fn numeric_bounds_are_enforced() {
        let request = CreateProductRequest {
            price: Some(dec!(-1)),
            discount_percentage: Some(dec!(120)),
            rating: Some(dec!(5.5)),
            stock: Some(-3),
            minimum_order_quantity: Some(0),
            weight: Some(-1),
            ..valid_create()
        };
        let errors: FieldErrors = request.validate().unwrap_err().into();

        for field in [
            "price",
            "discount_percentage",
            "rating",
            "stock",
            "minimum_order_quantity",
            "weight",
        ] {
            assert!(errors.contains_field(field), "expected error on {field}");
        }
    }

    #[test]
    fn nested_dimensions_use_dotted_paths() {
        let request = CreateProductRequest {
            dimensions: Some(DimensionsInput {
                width: Some(dec!(-2)),
                ..Default::default()
            }),
            ..valid_create()
        };
        let errors: FieldErrors = request.validate().unwrap_err().into();
        assert!(errors.contains_field("dimensions.width"));
    }

    #[test]
    fn urls_and_tags_are_checked() {
        let request = CreateProductRequest {
            thumbnail: Some("not a url".into()),
            images: Some(vec!["https://cdn.example.com/a.png".into(), "nope".into()]),
            tags: Some(vec!["ok".into(), "   ".into()]),
            ..valid_create()
        };
        let errors: FieldErrors = request.validate().unwrap_err().into();

        assert!(errors.contains_field("thumbnail"));
        assert!(errors.contains_field("images"));
        assert!(errors.contains_field("tags"));
    }

    #[test]
    fn blank_title_is_rejected_on_update() {
        let request = UpdateProductRequest {
            title: Some("   ".into()),
            ..Default::default()
        };
        let errors: FieldErrors = request.validate().unwrap_err().into();
        assert!(errors.contains_field("title"));
    }

    #[test]
    fn category_without_letters_or_digits_is_rejected() {
        let request = CreateProductRequest {
            category: Some("!!!".into()),
            ..valid_create()
        };
        let errors: FieldErrors = request.validate().unwrap_err().into();
        assert!(errors
            .iter()
            .any(|e| e.field == "category" && e.code == "slug"));

        let update = UpdateProductRequest {
            category: Some("???".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn decode_reports_type_errors_per_field() {
        let payload = Payload::<CreateProductRequest>::decode(json!({
            "price": "abc",
            "stock": -1,
            "images": "not-a-list",
            "description": "Warm light",
        }))
        .unwrap();

        let fields: Vec<&str> = payload.type_errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["images", "price"]);
        assert!(payload.type_errors.iter().all(|e| e.code == "type"));
        assert_eq!(payload.request.stock, Some(-1));
        assert_eq!(payload.request.price, None);
        assert_eq!(payload.request.description.as_deref(), Some("Warm light"));
    }

    #[test]
    fn decode_rejects_non_objects() {
        let err = Payload::<UpdateProductRequest>::decode(json!([1, 2])).unwrap_err();
        assert_matches!(err, ServiceError::InvalidInput(_));
    }

    #[test]
    fn tag_names_collapse() {
        let names = distinct_tag_names(&[
            " beauty ".into(),
            "beauty".into(),
            "".into(),
            "mascara".into(),
        ]);
        assert_eq!(names, vec!["beauty".to_string(), "mascara".to_string()]);
    }

    #[test]
    fn receipt_serializes_camel_case() {
        let receipt = DeletionReceipt {
            id: 3,
            title: "Lamp".into(),
            is_deleted: true,
            deleted_on: Utc::now(),
        };
        let json = serde_json::to_value(receipt).unwrap();
        assert_eq!(json["isDeleted"], true);
        assert!(json.get("deletedOn").is_some());
    }
}
