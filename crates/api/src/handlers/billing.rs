//! Handlers for the `/billing` resource.
//!
//! Thin boundary over the billing provider: these handlers only mint
//! provider-hosted session URLs. Credit grants for paid plans arrive
//! out-of-band and land in the ledger as grant entries.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tini_core::error::CoreError;
use tini_db::models::user::User;
use tini_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /billing/checkout`.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Provider price id for the plan being purchased.
    pub price_id: String,
}

/// Response body for both billing endpoints.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Provider-hosted URL to redirect the user to.
    pub url: String,
}

/// POST /api/v1/billing/checkout
///
/// Create a subscription checkout session for the caller, creating the
/// provider customer on first use.
pub async fn create_checkout(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<DataResponse<SessionResponse>>> {
    if payload.price_id.trim().is_empty() {
        return Err(AppError::BadRequest("price_id must not be empty".into()));
    }

    let user = load_user(&state, &auth).await?;
    let customer_id = ensure_customer(&state, &user).await?;
    let url = state
        .billing
        .create_checkout_session(&customer_id, &payload.price_id)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    tracing::info!(user_id = user.id, "Checkout session created");
    Ok(Json(DataResponse {
        data: SessionResponse { url },
    }))
}

/// POST /api/v1/billing/portal
///
/// Create a customer-portal session for managing an existing subscription.
pub async fn create_portal(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SessionResponse>>> {
    let user = load_user(&state, &auth).await?;
    let customer_id = ensure_customer(&state, &user).await?;
    let url = state
        .billing
        .create_portal_session(&customer_id)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    tracing::info!(user_id = user.id, "Portal session created");
    Ok(Json(DataResponse {
        data: SessionResponse { url },
    }))
}

async fn load_user(state: &AppState, auth: &AuthUser) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::NotFound { entity: "User" }.into())
}

/// Return the user's provider customer id, creating the customer on the
/// first billing interaction. The persisted id only ever transitions
/// NULL -> set, so a racing duplicate creation leaves one id in place.
async fn ensure_customer(state: &AppState, user: &User) -> AppResult<String> {
    if let Some(existing) = &user.stripe_customer_id {
        return Ok(existing.clone());
    }

    let customer_id = state
        .billing
        .create_customer(&user.email)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    UserRepo::set_stripe_customer_id(&state.pool, user.id, &customer_id).await?;

    // Re-read in case a concurrent call won the NULL -> set race.
    let persisted = UserRepo::find_by_id(&state.pool, user.id)
        .await?
        .and_then(|u| u.stripe_customer_id)
        .unwrap_or(customer_id);
    Ok(persisted)
}
