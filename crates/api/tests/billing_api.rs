//! HTTP-level integration tests for the billing session endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_user_with_token, post_json_auth};
use sqlx::PgPool;
use tini_db::repositories::UserRepo;

#[sqlx::test(migrations = "../db/migrations")]
async fn checkout_creates_customer_and_returns_session_url(pool: PgPool) {
    let (user, token) = create_user_with_token(&pool, "buyer@test.com").await;
    let (app, boundaries) = common::build_test_app_with_boundaries(pool.clone());

    let body = serde_json::json!({ "price_id": "price_pro_monthly" });
    let response = post_json_auth(app, "/api/v1/billing/checkout", &token, body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(
        json["data"]["url"],
        "https://billing.test/checkout/cus_test_1/price_pro_monthly"
    );

    // The provider customer id is persisted for subsequent sessions.
    let stored = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(stored.stripe_customer_id.as_deref(), Some("cus_test_1"));
    assert_eq!(boundaries.billing.customers_created(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn second_session_reuses_the_stored_customer(pool: PgPool) {
    let (_user, token) = create_user_with_token(&pool, "repeat@test.com").await;
    let (app, boundaries) = common::build_test_app_with_boundaries(pool);

    let body = serde_json::json!({ "price_id": "price_pro_monthly" });
    let response = post_json_auth(app.clone(), "/api/v1/billing/checkout", &token, body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json_auth(
        app,
        "/api/v1/billing/portal",
        &token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["url"], "https://billing.test/portal/cus_test_1");
    assert_eq!(boundaries.billing.customers_created(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn checkout_rejects_empty_price_id(pool: PgPool) {
    let (_user, token) = create_user_with_token(&pool, "empty@test.com").await;
    let app = common::build_test_app(pool);

    let body = serde_json::json!({ "price_id": "  " });
    let response = post_json_auth(app, "/api/v1/billing/checkout", &token, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn billing_requires_authentication(pool: PgPool) {
    let app = common::build_test_app(pool);

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/billing/portal")
        .header("Content-Type", "application/json")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
