//! Fire-and-forget dispatch of a freshly-created media record to the
//! rendering backend.
//!
//! The submission handler commits the debit + pending record first, then
//! spawns [`spawn_dispatch`] and returns. Dispatch failures are logged and
//! stashed in the record's metadata; they never roll back the debit or the
//! record. The record stays pollable and the stale-media sweep eventually
//! fails it if the backend never acknowledges the run.

use tini_core::media::GenerationMode;
use tini_db::models::media::MediaRecord;
use tini_db::repositories::MediaRepo;
use tini_render::DispatchRequest;

use crate::state::AppState;

/// Queue the backend run for `record` on a background task.
pub fn spawn_dispatch(state: AppState, record: MediaRecord) {
    tokio::spawn(async move {
        dispatch_record(&state, &record).await;
    });
}

async fn dispatch_record(state: &AppState, record: &MediaRecord) {
    let Some(mode) = GenerationMode::from_id(record.mode_id) else {
        // Unreachable through the submission handler, which validates the
        // mode before insert.
        tracing::error!(media_id = %record.id, mode_id = record.mode_id, "Unknown generation mode");
        return;
    };

    let request = DispatchRequest {
        media_id: record.id,
        mode,
        prompt: record.prompt.clone(),
        start_image_url: record.start_image_url.clone(),
        end_image_url: record.end_image_url.clone(),
    };

    match state.render.dispatch(&request).await {
        Ok(run_id) => {
            match MediaRepo::attach_run_id(&state.pool, record.id, &run_id).await {
                Ok(true) => {
                    tracing::info!(media_id = %record.id, run_id = %run_id, "Run id attached");
                }
                Ok(false) => {
                    tracing::warn!(
                        media_id = %record.id,
                        run_id = %run_id,
                        "Run id already attached, ignoring duplicate dispatch acknowledgment",
                    );
                }
                Err(e) => {
                    tracing::error!(
                        media_id = %record.id,
                        run_id = %run_id,
                        error = %e,
                        "Failed to persist run id (record stays pending)",
                    );
                }
            }
        }
        Err(e) => {
            tracing::error!(
                media_id = %record.id,
                error = %e,
                "Dispatch to rendering backend failed (record stays pending)",
            );
            if let Err(db_err) =
                MediaRepo::record_dispatch_error(&state.pool, record.id, &e.to_string()).await
            {
                tracing::error!(media_id = %record.id, error = %db_err, "Failed to record dispatch error");
            }
        }
    }
}
