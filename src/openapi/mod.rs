use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "1.0.0",
        description = r#"
# Catalog API

Product catalog and session management.

## Authentication

`POST /auth/login` returns a short-lived access token in the body and sets an HttpOnly
`refresh_token` cookie. Send the access token on protected routes:

```
Authorization: Bearer <access-token>
```

`POST /auth/refresh` rotates the cookie into a new pair; each refresh token works once.

## Pagination

List endpoints accept `limit` (1-100, default 30), `skip`, `select` (comma separated fields),
`sortBy` and `order` (`asc`/`desc`).

## Error Handling

```json
{
  "error": "Unprocessable Entity",
  "message": "Validation failed",
  "errors": [{"field": "title", "code": "required", "message": "title is required"}],
  "timestamp": "2024-01-01T00:00:00Z"
}
```

Authentication failures use `{"error": {"code": "AUTH_TOKEN_EXPIRED", "message": "..."}}`.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Products", description = "Product listing, search and mutation"),
        (name = "Categories", description = "Category listing and scoping"),
        (name = "Auth", description = "Registration and JWT sessions")
    ),
    paths(
        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::search_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::list_category_slugs,
        crate::handlers::categories::products_in_category,

        // Auth
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::refresh,
        crate::handlers::auth::me,
        crate::handlers::auth::logout,
    ),
    components(
        schemas(
            crate::services::catalog::ProductView,
            crate::services::catalog::DimensionsView,
            crate::services::catalog::ReviewView,
            crate::services::catalog::MetaView,
            crate::services::catalog::ProductPage,
            crate::services::catalog::CategorySummary,
            crate::services::catalog::CreateProductRequest,
            crate::services::catalog::UpdateProductRequest,
            crate::services::catalog::DimensionsInput,
            crate::services::catalog::DeletionReceipt,

            crate::auth::RegisterRequest,
            crate::auth::LoginRequest,
            crate::auth::LoginResponse,
            crate::auth::LogoutResponse,
            crate::auth::PublicUser,

            // Error types
            crate::errors::ErrorResponse,
            crate::errors::FieldError
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_catalog_and_auth_routes() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Catalog API"));
        assert!(json.contains("/products/category/{slug}"));
        assert!(json.contains("/auth/refresh"));
        assert!(json.contains("\"Bearer\""));
    }
}
