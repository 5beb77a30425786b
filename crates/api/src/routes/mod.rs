pub mod auth;
pub mod billing;
pub mod credits;
pub mod health;
pub mod media;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/signup                     create account + welcome credits (public)
/// /auth/login                      login (public)
/// /auth/me                         current user profile (requires auth)
///
/// /credits                         spendable balance (GET)
/// /credits/history                 ledger entries, newest first (GET)
///
/// /media                           list own records (GET)
/// /media/generate                  submit a generation (POST)
/// /media/selectable-images         reusable input images (GET)
/// /media/{id}/status               reconcile + report status (GET)
/// /media/{id}                      delete record + artifact (DELETE)
///
/// /billing/checkout                subscription checkout session (POST)
/// /billing/portal                  customer portal session (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Account creation, login, and profile.
        .nest("/auth", auth::router())
        // Credit balance and ledger history.
        .nest("/credits", credits::router())
        // Generation submission, polling, listing, deletion.
        .nest("/media", media::router())
        // Provider-hosted billing sessions.
        .nest("/billing", billing::router())
}
