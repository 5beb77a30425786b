//! Poll-driven status reconciliation.
//!
//! Each client poll syncs one media record with the rendering backend's
//! reported state. Every step is idempotent: terminal records short-circuit
//! to their stored result, and all transitions are conditional updates, so
//! overlapping polls for the same record cannot regress status, duplicate
//! ledger entries, or produce divergent artifacts.

use serde::Serialize;
use tini_core::media::GenerationMode;
use tini_db::models::media::MediaRecord;
use tini_db::models::status::MediaStatus;
use tini_db::repositories::MediaRepo;
use tini_render::RunState;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Response body for `GET /media/{id}/status`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MediaStatusResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Build the response for a record as currently stored.
fn stored_response(record: &MediaRecord) -> MediaStatusResponse {
    let status = record.status();
    MediaStatusResponse {
        status: status.as_str(),
        output_url: (!record.output_url.is_empty()).then(|| record.output_url.clone()),
        error: if status == MediaStatus::Failed {
            Some(
                record
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "Generation failed".to_string()),
            )
        } else {
            None
        },
    }
}

/// Reconcile one record against the backend and report its status.
///
/// The caller has already verified ownership. `record` is the row as read
/// at the start of the poll.
pub async fn poll(state: &AppState, record: MediaRecord) -> AppResult<MediaStatusResponse> {
    // Terminal records are served from storage. No backend query, no
    // further side effects.
    if record.status().is_terminal() {
        return Ok(stored_response(&record));
    }

    // The dispatch task may not have attached the run id yet. Report the
    // current status and let the client retry.
    let Some(run_id) = record.run_id.clone() else {
        tracing::debug!(media_id = %record.id, "No run id yet, still pending");
        return Ok(stored_response(&record));
    };

    let run_state = match state.render.run_status(&run_id).await {
        Ok(run_state) => run_state,
        Err(e) => {
            // Transient infrastructure errors must not fail the job: keep
            // the client polling instead of surfacing a false negative.
            tracing::warn!(
                media_id = %record.id,
                run_id = %run_id,
                error = %e,
                "Backend status query failed, reporting processing",
            );
            return Ok(MediaStatusResponse {
                status: MediaStatus::Processing.as_str(),
                output_url: None,
                error: None,
            });
        }
    };

    match run_state {
        RunState::Queued | RunState::Running => {
            if record.status() == MediaStatus::Pending {
                MediaRepo::mark_processing(&state.pool, record.id).await?;
            }
            Ok(MediaStatusResponse {
                status: MediaStatus::Processing.as_str(),
                output_url: None,
                error: None,
            })
        }
        RunState::Succeeded { output_url } => {
            complete_record(state, &record, &run_id, &output_url).await
        }
        RunState::Failed { error } => {
            let changed = MediaRepo::fail(&state.pool, record.id, &error).await?;
            if !changed {
                tracing::info!(
                    media_id = %record.id,
                    "Record already terminal, ignoring late failure signal",
                );
            } else {
                tracing::info!(media_id = %record.id, error = %error, "Generation failed");
            }
            refreshed_response(state, &record).await
        }
    }
}

/// Materialize the backend's output into our storage and mark the record
/// completed.
async fn complete_record(
    state: &AppState,
    record: &MediaRecord,
    run_id: &str,
    backend_output_url: &str,
) -> AppResult<MediaStatusResponse> {
    let mode = GenerationMode::from_id(record.mode_id).ok_or_else(|| {
        AppError::InternalError(format!("Unknown generation mode id {}", record.mode_id))
    })?;

    let bytes = match state.render.fetch_output(backend_output_url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // Same soft-failure policy as the status query: the artifact
            // is still on the backend, the next poll retries the download.
            tracing::warn!(
                media_id = %record.id,
                run_id = %run_id,
                error = %e,
                "Output download failed, reporting processing",
            );
            return Ok(MediaStatusResponse {
                status: MediaStatus::Processing.as_str(),
                output_url: None,
                error: None,
            });
        }
    };

    // Deterministic path: concurrent polls that both reach this point
    // write the same object, and the conditional update below picks one
    // winner for the status transition.
    let storage_path = format!(
        "media/{}/{}.{}",
        record.user_id,
        record.id,
        mode.output_extension()
    );

    let output_url = state
        .storage
        .put(&storage_path, bytes, mode.output_content_type())
        .await
        .map_err(|e| AppError::InternalError(format!("Artifact upload failed: {e}")))?;

    let changed = MediaRepo::complete(&state.pool, record.id, &output_url, &storage_path).await?;
    if changed {
        tracing::info!(
            media_id = %record.id,
            run_id = %run_id,
            storage_path = %storage_path,
            "Generation completed",
        );
    } else {
        tracing::info!(
            media_id = %record.id,
            "Record already terminal, ignoring duplicate completion signal",
        );
    }

    refreshed_response(state, record).await
}

/// Re-read the record and serve the stored result, so every caller sees
/// the transition winner's fields.
async fn refreshed_response(
    state: &AppState,
    record: &MediaRecord,
) -> AppResult<MediaStatusResponse> {
    let current = MediaRepo::find_by_id(&state.pool, record.id)
        .await?
        .ok_or(AppError::Core(tini_core::error::CoreError::NotFound {
            entity: "Media record",
        }))?;
    Ok(stored_response(&current))
}
