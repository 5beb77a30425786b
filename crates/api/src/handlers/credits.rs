//! Handlers for the `/credits` resource.

use axum::extract::State;
use axum::Json;
use tini_db::models::credit::{CreditBalance, CreditEntry};
use tini_db::repositories::CreditRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/credits
///
/// Return the caller's spendable balance, computed from ledger rows.
pub async fn get_balance(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CreditBalance>>> {
    let total = CreditRepo::balance(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: CreditBalance { total },
    }))
}

/// GET /api/v1/credits/history
///
/// Return the caller's ledger entries, newest first.
pub async fn get_history(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<CreditEntry>>>> {
    let entries = CreditRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: entries }))
}
