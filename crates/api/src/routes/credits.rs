//! Credit balance and ledger history routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::credits;
use crate::state::AppState;

/// Mount credit routes (intended for nesting under `/credits`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(credits::get_balance))
        .route("/history", get(credits::get_history))
}
