//! Shared helpers for HTTP-level integration tests.
//!
//! Mirrors the production router construction so tests exercise the same
//! middleware stack, with the external boundaries (rendering backend,
//! object store, billing provider) replaced by scripted in-memory fakes.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use tini_api::auth::jwt::JwtConfig;
use tini_api::billing::{BillingError, BillingProvider};
use tini_api::config::ServerConfig;
use tini_api::router::build_app_router;
use tini_api::state::AppState;
use tini_render::{DispatchRequest, RenderBackend, RenderError, RunState};
use tini_storage::MemoryStore;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-not-for-production".to_string(),
            access_token_expiry_mins: 60,
        },
        signup_credits: 50,
    }
}

/// Scripted [`RenderBackend`] for tests.
///
/// Dispatch hands out sequential run ids (`run-1`, `run-2`, ...) and
/// records the requests it saw; status and output fetches are driven by
/// the configured [`RunState`] and failure switches.
pub struct MockRenderBackend {
    dispatches: Mutex<Vec<DispatchRequest>>,
    next_run: AtomicUsize,
    run_state: Mutex<RunState>,
    fail_dispatch: AtomicBool,
    fail_status: AtomicBool,
    fail_fetch: AtomicBool,
    output: Vec<u8>,
}

impl MockRenderBackend {
    pub fn new() -> Self {
        Self {
            dispatches: Mutex::new(Vec::new()),
            next_run: AtomicUsize::new(1),
            run_state: Mutex::new(RunState::Queued),
            fail_dispatch: AtomicBool::new(false),
            fail_status: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
            output: b"artifact-bytes".to_vec(),
        }
    }

    pub fn set_run_state(&self, state: RunState) {
        *self.run_state.lock().unwrap() = state;
    }

    pub fn set_fail_dispatch(&self, fail: bool) {
        self.fail_dispatch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_status(&self, fail: bool) {
        self.fail_status.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatches.lock().unwrap().len()
    }
}

#[async_trait]
impl RenderBackend for MockRenderBackend {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<String, RenderError> {
        if self.fail_dispatch.load(Ordering::SeqCst) {
            return Err(RenderError::Api {
                status: 503,
                body: "backend unavailable".to_string(),
            });
        }
        self.dispatches.lock().unwrap().push(request.clone());
        let n = self.next_run.fetch_add(1, Ordering::SeqCst);
        Ok(format!("run-{n}"))
    }

    async fn run_status(&self, _run_id: &str) -> Result<RunState, RenderError> {
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(RenderError::Api {
                status: 500,
                body: "status query failed".to_string(),
            });
        }
        Ok(self.run_state.lock().unwrap().clone())
    }

    async fn fetch_output(&self, _output_url: &str) -> Result<Vec<u8>, RenderError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(RenderError::Api {
                status: 502,
                body: "download failed".to_string(),
            });
        }
        Ok(self.output.clone())
    }
}

/// [`BillingProvider`] stub returning fixed provider resources.
pub struct StubBillingProvider {
    customers_created: AtomicUsize,
}

impl StubBillingProvider {
    pub fn new() -> Self {
        Self {
            customers_created: AtomicUsize::new(0),
        }
    }

    pub fn customers_created(&self) -> usize {
        self.customers_created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BillingProvider for StubBillingProvider {
    async fn create_customer(&self, _email: &str) -> Result<String, BillingError> {
        let n = self.customers_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("cus_test_{n}"))
    }

    async fn create_checkout_session(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<String, BillingError> {
        Ok(format!(
            "https://billing.test/checkout/{customer_id}/{price_id}"
        ))
    }

    async fn create_portal_session(&self, customer_id: &str) -> Result<String, BillingError> {
        Ok(format!("https://billing.test/portal/{customer_id}"))
    }
}

/// Fakes behind a test app, for scripting and inspection.
pub struct TestBoundaries {
    pub render: Arc<MockRenderBackend>,
    pub storage: Arc<MemoryStore>,
    pub billing: Arc<StubBillingProvider>,
}

/// Build the full application router with default fakes.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_boundaries(pool).0
}

/// Build the full application router and return the fakes alongside it.
pub fn build_test_app_with_boundaries(pool: PgPool) -> (Router, TestBoundaries) {
    let config = test_config();
    let render = Arc::new(MockRenderBackend::new());
    let storage = Arc::new(MemoryStore::new());
    let billing = Arc::new(StubBillingProvider::new());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        render: render.clone(),
        storage: storage.clone(),
        billing: billing.clone(),
    };

    let app = build_app_router(state, &config);
    (
        app,
        TestBoundaries {
            render,
            storage,
            billing,
        },
    )
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

/// Create a user directly in the database and mint a matching access
/// token, bypassing the signup grant so tests control the ledger.
pub async fn create_user_with_token(
    pool: &PgPool,
    email: &str,
) -> (tini_db::models::user::User, String) {
    let hash = tini_api::auth::password::hash_password("test_password_123!")
        .expect("hashing should succeed");
    let user = tini_db::repositories::UserRepo::create(pool, email, &hash)
        .await
        .expect("user creation should succeed");
    let token =
        tini_api::auth::jwt::generate_access_token(user.id, &user.role, &test_config().jwt)
            .expect("token generation should succeed");
    (user, token)
}

/// Sign up through the API (welcome grant included) and return the user
/// id and access token.
pub async fn signup(app: Router, email: &str) -> (i64, String) {
    let body = serde_json::json!({ "email": email, "password": "test_password_123!" });
    let response = post_json(app, "/api/v1/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let user_id = json["data"]["user"]["id"].as_i64().expect("user id");
    let token = json["data"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string();
    (user_id, token)
}
