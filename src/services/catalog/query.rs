//! Listing parameters and the filters they translate into.

use sea_orm::{
    sea_query::{Expr, Func, LikeExpr, Query, SimpleExpr, SubQueryStatement},
    ColumnTrait, Condition, EntityTrait, Order, QueryFilter, QueryOrder, Select,
};
use serde::Deserialize;
use std::str::FromStr;
use strum::{AsRefStr, EnumString};
use utoipa::IntoParams;

use crate::entities::{category, product, product_tag, review, tag};
use crate::errors::{FieldErrors, ServiceError};

pub const DEFAULT_LIMIT: u64 = 30;
pub const MAX_LIMIT: u64 = 100;

/// Keys a client may name in `select`.
pub const SELECTABLE_FIELDS: &[&str] = &[
    "id",
    "title",
    "description",
    "category",
    "price",
    "discountPercentage",
    "rating",
    "stock",
    "tags",
    "brand",
    "sku",
    "weight",
    "dimensions",
    "warrantyInformation",
    "shippingInformation",
    "availabilityStatus",
    "reviews",
    "returnPolicy",
    "minimumOrderQuantity",
    "meta",
    "images",
    "thumbnail",
];

/// Raw listing parameters as they arrive on the query string.
///
/// Numbers are kept as text so that a malformed value is reported as a field
/// error instead of rejecting the whole query string.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Page size, 1 to 100 (default 30)
    pub limit: Option<String>,
    /// Rows to skip (default 0)
    pub skip: Option<String>,
    /// Comma-separated view fields; `id` is always returned
    pub select: Option<String>,
    /// id, title, price, stock, rating or created_at
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    /// asc or desc
    pub order: Option<String>,
}

/// Search parameters: the term plus the listing parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive term matched against title, description, tags and category
    pub q: Option<String>,
    pub limit: Option<String>,
    pub skip: Option<String>,
    pub select: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl SearchParams {
    /// The trimmed term, if one was supplied.
    pub fn term(&self) -> Option<&str> {
        blank_to_none(self.q.as_deref())
    }

    pub fn list(&self) -> ListParams {
        ListParams {
            limit: self.limit.clone(),
            skip: self.skip.clone(),
            select: self.select.clone(),
            sort_by: self.sort_by.clone(),
            order: self.order.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum SortField {
    #[default]
    #[strum(serialize = "id")]
    Id,
    #[strum(serialize = "title")]
    Title,
    #[strum(serialize = "price")]
    Price,
    #[strum(serialize = "stock")]
    Stock,
    #[strum(serialize = "rating")]
    Rating,
    #[strum(serialize = "created_at", serialize = "createdAt")]
    CreatedAt,
}

impl SortField {
    /// Unknown names fall back to `id`.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|value| SortField::from_str(value.trim()).ok())
            .unwrap_or_default()
    }

    /// Stored column backing the field. `Rating` has none: it is the review mean.
    pub fn column(self) -> Option<product::Column> {
        match self {
            SortField::Id => Some(product::Column::Id),
            SortField::Title => Some(product::Column::Title),
            SortField::Price => Some(product::Column::Price),
            SortField::Stock => Some(product::Column::Stock),
            SortField::Rating => None,
            SortField::CreatedAt => Some(product::Column::CreatedAt),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Unknown directions fall back to ascending.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(|value| SortOrder::from_str(value.trim()).ok())
            .unwrap_or_default()
    }

    fn as_order(self) -> Order {
        match self {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Validated listing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub limit: u64,
    pub skip: u64,
    pub select: Option<Vec<String>>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            skip: 0,
            select: None,
            sort: SortField::Id,
            order: SortOrder::Asc,
        }
    }
}

impl ListParams {
    /// Validates every parameter, reporting all offending fields at once.
    pub fn parse(&self) -> Result<ListQuery, ServiceError> {
        let mut errors = FieldErrors::new();

        let limit = match blank_to_none(self.limit.as_deref()).map(str::parse::<i64>) {
            None => DEFAULT_LIMIT,
            Some(Ok(value)) if (1..=MAX_LIMIT as i64).contains(&value) => value as u64,
            Some(Ok(_)) => {
                errors.push(
                    "limit",
                    "range",
                    format!("limit must be between 1 and {}", MAX_LIMIT),
                );
                DEFAULT_LIMIT
            }
            Some(Err(_)) => {
                errors.push("limit", "integer", "limit must be an integer");
                DEFAULT_LIMIT
            }
        };

        let skip = match blank_to_none(self.skip.as_deref()).map(str::parse::<i64>) {
            None => 0,
            Some(Ok(value)) if value >= 0 => value as u64,
            Some(Ok(_)) => {
                errors.push("skip", "range", "skip must be at least 0");
                0
            }
            Some(Err(_)) => {
                errors.push("skip", "integer", "skip must be an integer");
                0
            }
        };

        let select = self.parse_select(&mut errors);

        errors.into_result()?;

        Ok(ListQuery {
            limit,
            skip,
            select,
            sort: SortField::parse_or_default(self.sort_by.as_deref()),
            order: SortOrder::parse_or_default(self.order.as_deref()),
        })
    }

    fn parse_select(&self, errors: &mut FieldErrors) -> Option<Vec<String>> {
        let raw = blank_to_none(self.select.as_deref())?;

        let mut fields = vec!["id".to_string()];
        let mut named_any = false;
        for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            named_any = true;
            if !SELECTABLE_FIELDS.contains(&name) {
                errors.push("select", "in", format!("unknown field '{}'", name));
            } else if !fields.iter().any(|f| f == name) {
                fields.push(name.to_string());
            }
        }

        named_any.then_some(fields)
    }
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl ListQuery {
    /// Applies the requested ordering with `id` as the tiebreaker.
    ///
    /// Rating sorts on the review mean; unreviewed products come last in
    /// either direction.
    pub fn apply_order(&self, select: Select<product::Entity>) -> Select<product::Entity> {
        let order = self.order.as_order();
        let ordered = match self.sort.column() {
            Some(product::Column::Id) => return select.order_by(product::Column::Id, order),
            Some(column) => select.order_by(column, order),
            None => select
                .order_by(Expr::expr(review_mean()).is_null(), Order::Asc)
                .order_by(review_mean(), order),
        };
        ordered.order_by(product::Column::Id, Order::Asc)
    }
}

/// `AVG(reviews.rating)` for the outer product row, NULL without reviews.
fn review_mean() -> SimpleExpr {
    let mean = Query::select()
        .expr(Func::avg(Expr::col((review::Entity, review::Column::Rating))))
        .from(review::Entity)
        .and_where(
            Expr::col((review::Entity, review::Column::ProductId))
                .equals((product::Entity, product::Column::Id)),
        )
        .to_owned();
    SimpleExpr::SubQuery(None, Box::new(SubQueryStatement::SelectStatement(mean)))
}

/// Escapes LIKE metacharacters so the term matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn contains_ci<T>(column: T, pattern: &str) -> SimpleExpr
where
    T: sea_orm::sea_query::IntoColumnRef,
{
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\'))
}

/// Matches the term in the title, description, any tag name or the category name.
pub fn search_condition(term: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(&term.trim().to_lowercase()));

    let tagged = Query::select()
        .column((product_tag::Entity, product_tag::Column::ProductId))
        .from(product_tag::Entity)
        .inner_join(
            tag::Entity,
            Expr::col((tag::Entity, tag::Column::Id))
                .equals((product_tag::Entity, product_tag::Column::TagId)),
        )
        .and_where(contains_ci((tag::Entity, tag::Column::Name), &pattern))
        .to_owned();

    let categories = Query::select()
        .column((category::Entity, category::Column::Id))
        .from(category::Entity)
        .and_where(contains_ci((category::Entity, category::Column::Name), &pattern))
        .to_owned();

    Condition::any()
        .add(contains_ci((product::Entity, product::Column::Title), &pattern))
        .add(contains_ci(
            (product::Entity, product::Column::Description),
            &pattern,
        ))
        .add(product::Column::Id.in_subquery(tagged))
        .add(product::Column::CategoryId.in_subquery(categories))
}

/// Restricts a listing to one category.
pub fn category_condition(category_id: i32) -> Condition {
    Condition::all().add(product::Column::CategoryId.eq(category_id))
}

/// Listing without a filter.
pub fn all_products() -> Condition {
    Condition::all()
}

/// Entry point for every listing query.
pub fn products_matching(condition: Condition) -> Select<product::Entity> {
    product::Entity::find().filter(condition)
}
