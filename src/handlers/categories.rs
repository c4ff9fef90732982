use crate::handlers::common::success_response;
use crate::{
    errors::ApiError,
    services::catalog::{CategorySummary, ListParams, ProductPage},
    AppState,
};
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::IntoResponse,
};

/// List categories ordered by name
#[utoipa::path(
    get,
    path = "/products/categories",
    responses(
        (status = 200, description = "Categories", body = [CategorySummary])
    ),
    tag = "Categories"
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.catalog.categories().await?))
}

/// List category slugs ordered by category name
#[utoipa::path(
    get,
    path = "/products/category-list",
    responses(
        (status = 200, description = "Category slugs", body = [String])
    ),
    tag = "Categories"
)]
pub async fn list_category_slugs(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(success_response(state.catalog.category_slugs().await?))
}

/// List the products of one category
#[utoipa::path(
    get,
    path = "/products/category/{slug}",
    params(
        ("slug" = String, Path, description = "Category slug"),
        ListParams
    ),
    responses(
        (status = 200, description = "Product page", body = ProductPage),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid pagination or select", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn products_in_category(
    State(state): State<AppState>,
    slug: Result<Path<String>, PathRejection>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(slug) = slug?;
    let Query(params) = params?;
    let page = state.catalog.products_by_category(&slug, &params).await?;
    Ok(success_response(page))
}
