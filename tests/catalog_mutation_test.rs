//! Integration tests for product create, update and delete.
//!
//! Tests cover:
//! - Authentication on mutating routes
//! - Multi-field validation failures, including JSON type mismatches
//! - Transaction rollback when a child write fails
//! - Category, brand and tag find-or-create
//! - Image, tag and dimension replacement on update
//! - Deletion receipts and cascades

mod common;

use axum::http::Method;
use catalog_api::entities::{brand, category, product_tag, tag};
use catalog_api::services::catalog::{CreateProductRequest, ProductView};
use common::{auth_code, failing_fields, product_body, response_json, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};

async fn product_count(app: &TestApp) -> u64 {
    let (_, body) = app.get_json("/products").await;
    body["total"].as_u64().unwrap_or_default()
}

// ==================== Create ====================

#[tokio::test]
async fn create_requires_access_token() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/products/add",
            Some(product_body("Anonymous", "misc", &[])),
            None,
        )
        .await;
    assert_eq!(response.status(), 401);
    assert_eq!(auth_code(&response_json(response).await), "AUTH_MISSING_TOKEN");
    assert_eq!(product_count(&app).await, 0);
}

#[tokio::test]
async fn create_without_title_names_the_field_and_writes_nothing() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;

    let mut body = product_body("ignored", "misc", &[]);
    body.as_object_mut().unwrap().remove("title");

    let response = app
        .request(
            Method::POST,
            "/products/add",
            Some(body),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 422);
    assert_eq!(failing_fields(&response_json(response).await), vec!["title"]);
    assert_eq!(product_count(&app).await, 0);
}

#[tokio::test]
async fn create_collects_every_violation() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/products/add",
            Some(json!({
                "title": "Broken",
                "description": "   ",
                "category": "misc",
                "price": -1,
                "discount_percentage": 150,
                "stock": 3,
                "thumbnail": "not a url",
                "images": ["https://cdn.example.com/a.png", "nope"],
                "tags": [""],
                "dimensions": { "width": -2 }
            })),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 422);

    let fields = failing_fields(&response_json(response).await);
    for expected in [
        "description",
        "price",
        "discount_percentage",
        "thumbnail",
        "images",
        "tags",
        "dimensions.width",
    ] {
        assert!(
            fields.iter().any(|f| f == expected),
            "missing {expected} in {fields:?}"
        );
    }
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;

    let response = app
        .request_raw(
            Method::POST,
            "/products/add",
            r#"{"title": "Half"#,
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .request_raw(
            Method::POST,
            "/products/add",
            r#"["title", "price"]"#,
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(product_count(&app).await, 0);
}

#[tokio::test]
async fn type_mismatches_are_reported_with_other_violations() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/products/add",
            Some(json!({
                "description": "Typed badly",
                "category": "misc",
                "price": "abc",
                "stock": -1,
                "tags": "sale"
            })),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 422);

    let body = response_json(response).await;
    let errors: Vec<(String, String)> = body["errors"]
        .as_array()
        .expect("errors list")
        .iter()
        .map(|e| {
            (
                e["field"].as_str().unwrap_or_default().to_string(),
                e["code"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    for (field, code) in [
        ("price", "type"),
        ("tags", "type"),
        ("stock", "range"),
        ("title", "required"),
    ] {
        assert!(
            errors.iter().any(|(f, c)| f == field && c == code),
            "missing {field}/{code} in {errors:?}"
        );
    }
    assert_eq!(errors.iter().filter(|(f, _)| f == "price").count(), 1);
    assert_eq!(product_count(&app).await, 0);
}

#[tokio::test]
async fn category_without_slug_characters_is_rejected() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;

    for name in ["!!!", "???"] {
        let response = app
            .request(
                Method::POST,
                "/products/add",
                Some(product_body("Symbols", name, &[])),
                Some(&session.access_token),
            )
            .await;
        assert_eq!(response.status(), 422, "{name}");
        let body = response_json(response).await;
        assert_eq!(failing_fields(&body), vec!["category"]);
        assert_eq!(body["errors"][0]["code"], "slug");
    }

    let (_, categories) = app.get_json("/products/categories").await;
    assert_eq!(categories, json!([]));
    assert_eq!(product_count(&app).await, 0);
}

#[tokio::test]
async fn accented_category_gets_ascii_slug() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;

    let created = app
        .create_product(&session.access_token, product_body("Radio", "Électronique", &[]))
        .await;
    assert_eq!(created["category"], "Électronique");

    let (_, slugs) = app.get_json("/products/category-list").await;
    assert_eq!(slugs, json!(["electronique"]));
    let (status, _) = app.get_json("/products/category/electronique").await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn failing_child_write_rolls_back_the_product() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;
    let db = app.state.db.as_ref();

    db.execute_unprepared(
        "CREATE TRIGGER reject_flagged_images BEFORE INSERT ON product_images \
         WHEN NEW.url LIKE '%/rejected/%' \
         BEGIN SELECT RAISE(ABORT, 'image rejected'); END;",
    )
    .await
    .unwrap();

    let mut body = product_body("Half Written", "rollback", &["orphan"]);
    body["brand"] = json!("Ghost Brand");
    body["images"] = json!(["https://cdn.example.com/rejected/1.png"]);

    let response = app
        .request(
            Method::POST,
            "/products/add",
            Some(body),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 500);

    assert_eq!(product_count(&app).await, 0);
    assert_eq!(category::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(brand::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(tag::Entity::find().count(db).await.unwrap(), 0);
}

#[tokio::test]
async fn create_builds_full_view_with_relations() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;

    let created = app
        .create_product(
            &session.access_token,
            json!({
                "title": "  Essence Mascara Lash Princess ",
                "description": "Popular mascara known for its volumizing effects.",
                "category": "beauty products",
                "brand": "Essence",
                "price": 9.99,
                "discountPercentage": 7.17,
                "stock": 5,
                "sku": "RCH45Q1A",
                "weight": 2,
                "dimensions": { "width": 23.17, "height": 14.43, "depth": 28.01 },
                "warranty_information": "1 month warranty",
                "minimum_order_quantity": 24,
                "thumbnail": "https://cdn.example.com/mascara/thumbnail.png",
                "images": ["https://cdn.example.com/mascara/1.png"],
                "tags": ["mascara", "beauty", "mascara"]
            }),
        )
        .await;

    assert_eq!(created["title"], "Essence Mascara Lash Princess");
    assert_eq!(created["category"], "Beauty Products");
    assert_eq!(created["brand"], "Essence");
    assert_eq!(created["sku"], "RCH45Q1A");
    assert_eq!(created["tags"], json!(["beauty", "mascara"]));
    assert_eq!(created["images"], json!(["https://cdn.example.com/mascara/1.png"]));
    assert_eq!(created["minimumOrderQuantity"], 24);
    assert_eq!(created["warrantyInformation"], "1 month warranty");
    assert!(created["dimensions"]["width"].is_number());
    assert_eq!(created["rating"], Value::Null);

    let (_, categories) = app.get_json("/products/category-list").await;
    assert_eq!(categories, json!(["beauty-products"]));
}

#[tokio::test]
async fn existing_tags_and_categories_are_reused() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;

    app.create_product(&session.access_token, product_body("First", "home decor", &["sale"]))
        .await;
    app.create_product(&session.access_token, product_body("Second", "Home Decor", &["sale", " gift "]))
        .await;

    let db = app.state.db.as_ref();
    let sale = tag::Entity::find()
        .filter(tag::Column::Name.eq("sale"))
        .all(db)
        .await
        .unwrap();
    assert_eq!(sale.len(), 1);
    assert_eq!(
        product_tag::Entity::find()
            .filter(product_tag::Column::TagId.eq(sale[0].id))
            .count(db)
            .await
            .unwrap(),
        2
    );
    assert_eq!(tag::Entity::find().count(db).await.unwrap(), 2);
    assert_eq!(category::Entity::find().count(db).await.unwrap(), 1);
}

#[tokio::test]
async fn concurrent_creates_share_one_new_category() {
    let app = TestApp::new().await;
    let catalog = app.catalog();

    let request = |title: &str| CreateProductRequest {
        title: Some(title.to_string()),
        description: Some("Concurrent insert".to_string()),
        category: Some("gadgets".to_string()),
        price: Some(dec!(5.00)),
        stock: Some(1),
        tags: Some(vec!["new".to_string()]),
        ..Default::default()
    };

    let (a, b) = tokio::join!(
        catalog.create_product(request("Alpha")),
        catalog.create_product(request("Beta"))
    );
    let (a, b): (ProductView, ProductView) = (a.unwrap(), b.unwrap());
    assert_eq!(a.category, b.category);

    let db = app.state.db.as_ref();
    assert_eq!(category::Entity::find().count(db).await.unwrap(), 1);
    assert_eq!(tag::Entity::find().count(db).await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_sku_conflicts() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;

    let mut first = product_body("First", "misc", &[]);
    first["sku"] = json!("SKU-1");
    app.create_product(&session.access_token, first).await;

    let mut second = product_body("Second", "misc", &[]);
    second["sku"] = json!("SKU-1");
    let response = app
        .request(
            Method::POST,
            "/products/add",
            Some(second),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 409);
    assert_eq!(product_count(&app).await, 1);
}

// ==================== Update ====================

#[tokio::test]
async fn update_is_partial_and_replaces_collections() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;

    let mut body = product_body("Lamp", "home", &["light", "desk"]);
    body["images"] = json!(["https://cdn.example.com/old/1.png", "https://cdn.example.com/old/2.png"]);
    body["dimensions"] = json!({ "width": 10, "height": 20 });
    let created = app.create_product(&session.access_token, body).await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::PUT,
            &format!("/products/{id}"),
            Some(json!({
                "title": "Desk Lamp",
                "images": ["https://cdn.example.com/a.png", "https://cdn.example.com/b.png"],
                "tags": [],
                "dimensions": { "depth": 5 }
            })),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated = response_json(response).await;

    assert_eq!(updated["title"], "Desk Lamp");
    assert_eq!(updated["description"], created["description"]);
    assert_eq!(updated["stock"], created["stock"]);
    assert_eq!(
        updated["images"],
        json!(["https://cdn.example.com/a.png", "https://cdn.example.com/b.png"])
    );
    assert_eq!(updated["tags"], json!([]));
    assert_eq!(updated["dimensions"]["width"], json!(10.0));
    assert_eq!(updated["dimensions"]["depth"], json!(5.0));
}

#[tokio::test]
async fn update_checks_category_id_existence() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;
    let created = app
        .create_product(&session.access_token, product_body("Chair", "furniture", &[]))
        .await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::PUT,
            &format!("/products/{id}"),
            Some(json!({ "category_id": 4242 })),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 422);
    assert_eq!(failing_fields(&response_json(response).await), vec!["category_id"]);

    let response = app
        .request(
            Method::PUT,
            &format!("/products/{id}"),
            Some(json!({ "price": -5, "category_id": 4242 })),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 422);
    let mut fields = failing_fields(&response_json(response).await);
    fields.sort();
    assert_eq!(fields, vec!["category_id", "price"]);

    app.create_product(&session.access_token, product_body("Sofa", "living room", &[]))
        .await;
    let living_room = category::Entity::find()
        .filter(category::Column::Slug.eq("living-room"))
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .expect("category created");

    let response = app
        .request(
            Method::PUT,
            &format!("/products/{id}"),
            Some(json!({ "category_id": living_room.id })),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["category"], "Living Room");
}

#[tokio::test]
async fn update_unknown_product_is_not_found() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;

    let response = app
        .request(
            Method::PUT,
            "/products/777",
            Some(json!({ "title": "Ghost" })),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 404);
}

// ==================== Delete ====================

#[tokio::test]
async fn delete_returns_receipt_and_detaches_tags() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;
    let created = app
        .create_product(&session.access_token, product_body("Vase", "home", &["decor"]))
        .await;
    let id = created["id"].as_i64().unwrap();

    let response = app
        .request(
            Method::DELETE,
            &format!("/products/{id}"),
            None,
            Some(&session.access_token),
        )
        .await;
    assert_eq!(response.status(), 200);
    let receipt = response_json(response).await;
    assert_eq!(receipt["id"], id);
    assert_eq!(receipt["title"], "Vase");
    assert_eq!(receipt["isDeleted"], true);
    assert!(receipt["deletedOn"].is_string());

    let (status, _) = app.get_json(&format!("/products/{id}")).await;
    assert_eq!(status, 404);

    let db = app.state.db.as_ref();
    assert_eq!(product_tag::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(tag::Entity::find().count(db).await.unwrap(), 1);

    let again = app
        .request(
            Method::DELETE,
            &format!("/products/{id}"),
            None,
            Some(&session.access_token),
        )
        .await;
    assert_eq!(again.status(), 404);
}

#[tokio::test]
async fn deleting_a_category_cascades_to_products() {
    let app = TestApp::new().await;
    let session = app.signed_in("writer@example.com").await;
    let created = app
        .create_product(&session.access_token, product_body("Kettle", "kitchen", &["tea"]))
        .await;
    let id = created["id"].as_i64().unwrap();

    let db = app.state.db.as_ref();
    category::Entity::delete_many()
        .filter(category::Column::Slug.eq("kitchen"))
        .exec(db)
        .await
        .unwrap();

    let (status, _) = app.get_json(&format!("/products/{id}")).await;
    assert_eq!(status, 404);
    assert_eq!(product_count(&app).await, 0);
}
