//! Handlers for the `/media` resource: submission, status polling,
//! listing, selectable-image lookup, and deletion.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tini_core::error::CoreError;
use tini_core::media::{self, GenerationMode};
use tini_core::roles::ROLE_ADMIN;
use tini_core::types::MediaId;
use tini_db::models::media::{MediaListQuery, MediaRecord, NewMediaRecord, SelectableImage};
use tini_db::repositories::{CreditRepo, MediaRepo};

use crate::engine::{dispatch, reconcile};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /media/generate`.
#[derive(Debug, Deserialize)]
pub struct SubmitMediaRequest {
    pub prompt: String,
    /// Wire mode name: `image`, `video`, or `first_last_frame_video`.
    pub generation_mode: String,
    pub start_image_url: Option<String>,
    pub end_image_url: Option<String>,
}

/// Response body for `POST /media/generate`.
#[derive(Debug, Serialize)]
pub struct SubmitMediaResponse {
    pub media_id: MediaId,
    pub status: &'static str,
    pub credits_charged: i64,
}

/// POST /api/v1/media/generate
///
/// Validate the submission, then debit the cost and insert the pending
/// record in a single transaction. The user row is locked first so two
/// concurrent submissions from the same user serialize on the balance
/// check. Dispatch runs after commit on a background task; its failures
/// never undo the debit.
pub async fn submit_media(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitMediaRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SubmitMediaResponse>>)> {
    let mode = GenerationMode::parse(&payload.generation_mode).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unknown generation mode: {}",
            payload.generation_mode
        ))
    })?;
    media::validate_submission(
        mode,
        &payload.prompt,
        payload.start_image_url.as_deref(),
        payload.end_image_url.as_deref(),
    )?;

    let cost = mode.credit_cost();
    let description = format!(
        "Generate {}: \"{}\"",
        mode.as_str(),
        media::prompt_preview(&payload.prompt)
    );

    let mut tx = state.pool.begin().await?;
    CreditRepo::lock_user(&mut *tx, auth.user_id).await?;

    let balance = CreditRepo::balance(&mut *tx, auth.user_id).await?;
    if balance < cost {
        return Err(CoreError::InsufficientCredits {
            required: cost,
            available: balance,
        }
        .into());
    }

    CreditRepo::debit(&mut *tx, auth.user_id, cost, &description).await?;
    let record = MediaRepo::create(
        &mut *tx,
        &NewMediaRecord {
            user_id: auth.user_id,
            mode_id: mode.id(),
            prompt: &payload.prompt,
            start_image_url: payload.start_image_url.as_deref(),
            end_image_url: payload.end_image_url.as_deref(),
            credits_charged: cost,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        media_id = %record.id,
        user_id = auth.user_id,
        mode = mode.as_str(),
        cost,
        "Media submission accepted",
    );

    let response = SubmitMediaResponse {
        media_id: record.id,
        status: record.status().as_str(),
        credits_charged: cost,
    };
    dispatch::spawn_dispatch(state, record);

    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// GET /api/v1/media/{id}/status
///
/// Reconcile the record against the rendering backend and report the
/// result. Terminal records are served from storage without a backend
/// query.
pub async fn poll_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<MediaId>,
) -> AppResult<Json<DataResponse<reconcile::MediaStatusResponse>>> {
    let record = find_owned(&state, &auth, id).await?;
    let status = reconcile::poll(&state, record).await?;
    Ok(Json(DataResponse { data: status }))
}

/// GET /api/v1/media
///
/// List the caller's records, newest first, with optional status filter.
pub async fn list_media(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<MediaListQuery>,
) -> AppResult<Json<DataResponse<Vec<MediaRecord>>>> {
    let records = MediaRepo::list_by_user(&state.pool, auth.user_id, &params).await?;
    Ok(Json(DataResponse { data: records }))
}

/// GET /api/v1/media/selectable-images
///
/// Merge the caller's completed generated images with their uploaded
/// input images, deduplicated and sorted by label.
pub async fn selectable_images(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SelectableImage>>>> {
    let mut by_label: BTreeMap<String, SelectableImage> = BTreeMap::new();

    let generated = MediaRepo::list_completed_images(&state.pool, auth.user_id).await?;
    for record in generated {
        let label = format!("Gen: {}", media::prompt_preview(&record.prompt));
        by_label.entry(label.clone()).or_insert(SelectableImage {
            value: record.output_url,
            label,
            kind: "generated",
        });
    }

    let prefix = format!("inputs/{}/", auth.user_id);
    let inputs = state
        .storage
        .list(&prefix)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    for object in inputs {
        if !media::is_image_filename(&object.name) {
            continue;
        }
        let label = format!("Input: {}", object.name);
        by_label.entry(label.clone()).or_insert(SelectableImage {
            value: object.public_url,
            label,
            kind: "input",
        });
    }

    Ok(Json(DataResponse {
        data: by_label.into_values().collect(),
    }))
}

/// DELETE /api/v1/media/{id}
///
/// Remove the record and its stored artifact. Storage deletion is
/// idempotent and a storage failure does not block removing the row;
/// the orphaned object is logged for out-of-band cleanup.
pub async fn delete_media(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<MediaId>,
) -> AppResult<StatusCode> {
    let record = find_owned(&state, &auth, id).await?;

    if !record.storage_path.is_empty() {
        if let Err(e) = state.storage.delete(&record.storage_path).await {
            tracing::error!(
                media_id = %record.id,
                storage_path = %record.storage_path,
                error = %e,
                "Failed to delete stored artifact, removing record anyway",
            );
        }
    }

    MediaRepo::delete(&state.pool, id).await?;
    tracing::info!(media_id = %id, user_id = auth.user_id, "Media record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Load a record and verify the caller may act on it. Admins may act on
/// any record.
async fn find_owned(state: &AppState, auth: &AuthUser, id: MediaId) -> AppResult<MediaRecord> {
    let record = MediaRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Media record",
        })?;
    if record.user_id != auth.user_id && auth.role != ROLE_ADMIN {
        return Err(CoreError::Forbidden("Cannot access another user's media".into()).into());
    }
    Ok(record)
}
