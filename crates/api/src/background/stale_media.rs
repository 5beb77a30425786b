//! Periodic sweep failing media records stuck in a non-terminal state.
//!
//! Dispatch is fire-and-forget and reconciliation is client-driven, so a
//! record whose run was never acknowledged (or whose owner stopped
//! polling) can sit in `pending`/`processing` forever. This task flips
//! records older than the configured maximum age to `failed`. Runs on a
//! fixed interval using `tokio::time::interval`.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tini_db::repositories::MediaRepo;
use tokio_util::sync::CancellationToken;

/// Default maximum age before a non-terminal record is failed: 60 minutes.
const DEFAULT_MAX_AGE_MINS: i64 = 60;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300); // 5 minutes

/// Error message written onto swept records.
const STALE_ERROR: &str = "Generation timed out";

/// Run the stale-media sweep loop.
///
/// Fails non-terminal records older than `MEDIA_MAX_AGE_MINS` (defaults
/// to 60). Runs until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    let max_age_mins: i64 = std::env::var("MEDIA_MAX_AGE_MINS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_AGE_MINS);

    tracing::info!(
        max_age_mins,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Stale media sweep started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stale media sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::minutes(max_age_mins);
                match MediaRepo::fail_stale(&pool, cutoff, STALE_ERROR).await {
                    Ok(failed) => {
                        if failed > 0 {
                            tracing::info!(failed, "Stale media sweep: failed stuck records");
                        } else {
                            tracing::debug!("Stale media sweep: nothing to do");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Stale media sweep failed");
                    }
                }
            }
        }
    }
}
