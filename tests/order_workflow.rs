//! End-to-end checks against a live Postgres database. Each test gets its
//! own schema via `#[sqlx::test]`, which runs the migrations in
//! `./migrations` first. The tests are ignored by default; run them with a
//! scratch database:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/sellerhub_test cargo test -- --ignored
//! ```

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use sellerhub::api;
use sellerhub::auth::USER_ID_HEADER;
use sellerhub::domain::status::OrderStatus;
use sellerhub::state::AppState;
use sellerhub::store::{self, Db};

fn app(pool: PgPool) -> Router {
    api::router(AppState::new(Db::new(pool)))
}

async fn seed_account(
    pool: &PgPool,
    role: &str,
    super_seller_id: Option<Uuid>,
    permissions: Option<serde_json::Value>,
) -> Uuid {
    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO accounts (id, email, display_name, role, super_seller_id, permissions) \
         VALUES ($1, $2, $3, $4::account_role, $5, $6)",
    )
    .bind(id)
    .bind(format!("{id}@example.com"))
    .bind("Test Account")
    .bind(role)
    .bind(super_seller_id)
    .bind(permissions)
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn seed_order(pool: &PgPool, seller: Uuid, customer: Uuid, status: &str) -> Uuid {
    let id = Uuid::now_v7();
    sqlx::query(
        "INSERT INTO orders (id, seller_id, customer_id, status, total_amount) \
         VALUES ($1, $2, $3, $4::order_status, 50)",
    )
    .bind(id)
    .bind(seller)
    .bind(customer)
    .bind(status)
    .execute(pool)
    .await
    .unwrap();
    id
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    user: Uuid,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, user.to_string());
    let request = match body {
        Some(payload) => builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn history_count(pool: &PgPool, order: Uuid) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM order_status_history WHERE order_id = $1")
            .bind(order)
            .fetch_one(pool)
            .await
            .unwrap();
    count
}

async fn current_status(pool: &PgPool, order: Uuid) -> String {
    let (status,): (String,) = sqlx::query_as("SELECT status::text FROM orders WHERE id = $1")
        .bind(order)
        .fetch_one(pool)
        .await
        .unwrap();
    status
}

#[sqlx::test]
#[ignore = "requires a Postgres instance"]
async fn status_change_writes_exactly_one_history_row(pool: PgPool) {
    let seller = seed_account(&pool, "SUPER_SELLER", None, None).await;
    let customer = seed_account(&pool, "CUSTOMER", None, None).await;
    let order = seed_order(&pool, seller, customer, "PENDING").await;

    let (status, body) = send(
        app(pool.clone()),
        "PUT",
        &format!("/api/seller/orders/{order}"),
        seller,
        Some(json!({"status": "CONFIRMED", "notes": "stock verified"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CONFIRMED");
    assert_eq!(current_status(&pool, order).await, "CONFIRMED");
    assert_eq!(history_count(&pool, order).await, 1);
    assert!(body["notes"].as_str().unwrap().contains("stock verified"));
}

#[sqlx::test]
#[ignore = "requires a Postgres instance"]
async fn rejected_transition_leaves_no_trace(pool: PgPool) {
    let seller = seed_account(&pool, "SUPER_SELLER", None, None).await;
    let customer = seed_account(&pool, "CUSTOMER", None, None).await;
    let order = seed_order(&pool, seller, customer, "CANCELLED").await;

    let (status, body) = send(
        app(pool.clone()),
        "PUT",
        &format!("/api/seller/orders/{order}"),
        seller,
        Some(json!({"status": "CONFIRMED"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_transition");
    assert_eq!(current_status(&pool, order).await, "CANCELLED");
    assert_eq!(history_count(&pool, order).await, 0);
}

#[sqlx::test]
#[ignore = "requires a Postgres instance"]
async fn stale_status_is_not_applied(pool: PgPool) {
    let db = Db::new(pool.clone());
    let seller = seed_account(&pool, "SUPER_SELLER", None, None).await;
    let customer = seed_account(&pool, "CUSTOMER", None, None).await;
    let order = seed_order(&pool, seller, customer, "PENDING").await;

    // first writer wins
    let applied = store::orders::apply_status_change(
        &db,
        order,
        OrderStatus::Pending,
        OrderStatus::Cancelled,
        seller,
        None,
        None,
    )
    .await
    .unwrap();
    assert!(applied.is_some());

    // second writer validated against a snapshot that is now stale; the
    // cancelled order must not slip back into the open workflow
    let stale = store::orders::apply_status_change(
        &db,
        order,
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        seller,
        None,
        None,
    )
    .await
    .unwrap();
    assert!(stale.is_none());

    assert_eq!(current_status(&pool, order).await, "CANCELLED");
    assert_eq!(history_count(&pool, order).await, 1);
}

#[sqlx::test]
#[ignore = "requires a Postgres instance"]
async fn foreign_sellers_order_is_forbidden(pool: PgPool) {
    let owner = seed_account(&pool, "SUPER_SELLER", None, None).await;
    let other = seed_account(&pool, "SUPER_SELLER", None, None).await;
    let customer = seed_account(&pool, "CUSTOMER", None, None).await;
    let order = seed_order(&pool, owner, customer, "PENDING").await;

    let (status, body) = send(
        app(pool.clone()),
        "GET",
        &format!("/api/seller/orders/{order}"),
        other,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    // a write attempt is rejected the same way, before any mutation
    let (status, _) = send(
        app(pool.clone()),
        "PUT",
        &format!("/api/seller/orders/{order}"),
        other,
        Some(json!({"status": "CONFIRMED"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(current_status(&pool, order).await, "PENDING");
}

#[sqlx::test]
#[ignore = "requires a Postgres instance"]
async fn delegated_staff_need_the_manage_orders_grant(pool: PgPool) {
    let parent = seed_account(&pool, "SUPER_SELLER", None, None).await;
    let customer = seed_account(&pool, "CUSTOMER", None, None).await;
    let order = seed_order(&pool, parent, customer, "PENDING").await;

    let viewer = seed_account(
        &pool,
        "USER_SELLER",
        Some(parent),
        Some(json!({"view_analytics": true})),
    )
    .await;
    let (status, body) = send(
        app(pool.clone()),
        "PUT",
        &format!("/api/seller/orders/{order}"),
        viewer,
        Some(json!({"status": "CONFIRMED"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(current_status(&pool, order).await, "PENDING");

    // granted staff act within the parent's scope
    let manager = seed_account(
        &pool,
        "USER_SELLER",
        Some(parent),
        Some(json!({"manage_orders": true})),
    )
    .await;
    let (status, body) = send(
        app(pool.clone()),
        "PUT",
        &format!("/api/seller/orders/{order}"),
        manager,
        Some(json!({"status": "CONFIRMED"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CONFIRMED");
}

#[sqlx::test]
#[ignore = "requires a Postgres instance"]
async fn notes_append_in_submission_order(pool: PgPool) {
    let seller = seed_account(&pool, "SUPER_SELLER", None, None).await;
    let customer = seed_account(&pool, "CUSTOMER", None, None).await;
    let order = seed_order(&pool, seller, customer, "PENDING").await;
    let uri = format!("/api/seller/orders/{order}/notes");

    let (status, _) = send(
        app(pool.clone()),
        "POST",
        &uri,
        seller,
        Some(json!({"note": "called the customer"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app(pool.clone()),
        "POST",
        &uri,
        seller,
        Some(json!({"note": "rescheduled delivery"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let notes = body["notes"].as_str().unwrap();
    let first = notes.find("called the customer").unwrap();
    let second = notes.find("rescheduled delivery").unwrap();
    assert!(first < second);
}

#[sqlx::test]
#[ignore = "requires a Postgres instance"]
async fn barcode_is_unique_across_products_and_variants(pool: PgPool) {
    let seller = seed_account(&pool, "SUPER_SELLER", None, None).await;
    let app_state = app(pool.clone());

    let (status, product) = send(
        app_state.clone(),
        "POST",
        "/api/seller/products",
        seller,
        Some(json!({"name": "Espresso beans", "price": "12.50", "barcode": "4006381333931"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // the handler pre-check reports the clash as a conflict
    let product_id = product["id"].as_str().unwrap();
    let (status, body) = send(
        app_state.clone(),
        "POST",
        &format!("/api/seller/products/{product_id}/variants"),
        seller,
        Some(json!({"name": "250g bag", "barcode": "4006381333931"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    // the registry itself rejects a racing writer that skipped the pre-check
    let db = Db::new(pool.clone());
    let direct = store::products::insert_variant(
        &db,
        product_id.parse().unwrap(),
        &store::products::VariantInput {
            name: "250g bag".into(),
            sku: None,
            price: None,
            stock: 0,
            attributes: json!({}),
            barcode: Some("4006381333931".into()),
        },
    )
    .await;
    assert!(matches!(
        direct,
        Err(sqlx::Error::Database(ref e)) if e.is_unique_violation()
    ));
}
