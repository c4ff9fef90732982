use crate::auth::{AuthRouterExt, AuthUser};
use crate::handlers::common::{created_response, json_body, success_response};
use crate::handlers::categories;
use crate::{
    errors::ApiError,
    services::catalog::{
        CreateProductRequest, DeletionReceipt, ListParams, Payload, ProductPage, ProductView,
        SearchParams, UpdateProductRequest,
    },
    AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Json, Path, Query, State,
    },
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde_json::Value;
use tracing::debug;

/// Creates the router for product and category endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/search", get(search_products))
        .route("/categories", get(categories::list_categories))
        .route("/category-list", get(categories::list_category_slugs))
        .route("/category/{slug}", get(categories::products_in_category))
        .route("/add", post(create_product).with_auth())
        .route(
            "/{id}",
            get(get_product).merge(put(update_product).delete(delete_product).with_auth()),
        )
}

fn product_id(id: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    id.map(|Path(id)| id).map_err(ApiError::from)
}

/// List products
#[utoipa::path(
    get,
    path = "/products",
    params(ListParams),
    responses(
        (status = 200, description = "Product page", body = ProductPage),
        (status = 422, description = "Invalid pagination or select", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let page = state.catalog.list_products(&params).await?;
    Ok(success_response(page))
}

/// Search products by title, description, tag or category name
#[utoipa::path(
    get,
    path = "/products/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching products", body = ProductPage),
        (status = 422, description = "Invalid pagination or select", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let page = state.catalog.search_products(&params).await?;
    debug!(total = page.total, "search completed");
    Ok(success_response(page))
}

/// Get a single product
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product retrieved", body = ProductView),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = product_id(id)?;
    let product = state.catalog.get_product(id).await?;
    Ok(success_response(product))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "/products/add",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductView),
        (status = 400, description = "Malformed payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Duplicate SKU", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid fields", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn create_product(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = Payload::<CreateProductRequest>::decode(json_body(payload)?)?;
    debug!(user_id = %user.user_id, "creating product");
    let product = state.catalog.create_product(payload).await?;
    Ok(created_response(product))
}

/// Partially update a product
#[utoipa::path(
    put,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate SKU", body = crate::errors::ErrorResponse),
        (status = 422, description = "Invalid fields", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn update_product(
    _user: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = product_id(id)?;
    let payload = Payload::<UpdateProductRequest>::decode(json_body(payload)?)?;
    let product = state.catalog.update_product(id, payload).await?;
    Ok(success_response(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(
        ("id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = DeletionReceipt),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("Bearer" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    _user: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = product_id(id)?;
    let receipt = state.catalog.delete_product(id).await?;
    Ok(success_response(receipt))
}
