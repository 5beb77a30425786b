//! Billing session routes.

use axum::routing::post;
use axum::Router;

use crate::handlers::billing;
use crate::state::AppState;

/// Mount billing routes (intended for nesting under `/billing`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(billing::create_checkout))
        .route("/portal", post(billing::create_portal))
}
