//! Repository for the `media_records` table.
//!
//! All lifecycle transitions are conditional single-statement updates so
//! that concurrent duplicate polls for the same record cannot regress a
//! terminal status or apply a transition twice. Callers inspect the
//! returned `bool` ("did a row change") and treat `false` as a logged
//! no-op, not an error.

use sqlx::{PgExecutor, PgPool};
use tini_core::media::GenerationMode;
use tini_core::types::{DbId, MediaId, Timestamp};
use uuid::Uuid;

use crate::models::media::{MediaListQuery, MediaRecord, NewMediaRecord};
use crate::models::status::{MediaStatus, StatusId};

/// Column list for `media_records` queries.
const COLUMNS: &str = "\
    id, user_id, mode_id, prompt, start_image_url, end_image_url, \
    status_id, run_id, output_url, storage_path, credits_charged, \
    error_message, metadata, created_at, updated_at";

/// Maximum page size for media listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for media listing.
const DEFAULT_LIMIT: i64 = 50;

/// Terminal statuses: completed, failed.
const TERMINAL_STATUSES: [StatusId; 2] = [
    MediaStatus::Completed as StatusId,
    MediaStatus::Failed as StatusId,
];

/// Provides CRUD and lifecycle operations for media records.
pub struct MediaRepo;

impl MediaRepo {
    /// Insert a new pending record with empty output fields.
    ///
    /// The UUID v7 id is generated here, before insert, so the submission
    /// transaction can hand it to the dispatcher after commit.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        input: &NewMediaRecord<'_>,
    ) -> Result<MediaRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO media_records \
                 (id, user_id, mode_id, prompt, start_image_url, end_image_url, \
                  status_id, credits_charged) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaRecord>(&query)
            .bind(Uuid::now_v7())
            .bind(input.user_id)
            .bind(input.mode_id)
            .bind(input.prompt)
            .bind(input.start_image_url)
            .bind(input.end_image_url)
            .bind(MediaStatus::Pending.id())
            .bind(input.credits_charged)
            .fetch_one(executor)
            .await
    }

    /// Attach the backend's correlation id. Only sets it where it is still
    /// NULL, so a duplicate dispatch acknowledgment is a no-op.
    pub async fn attach_run_id(
        pool: &PgPool,
        id: MediaId,
        run_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE media_records SET run_id = $2, updated_at = NOW() \
             WHERE id = $1 AND run_id IS NULL",
        )
        .bind(id)
        .bind(run_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a pending record to processing once the backend reports the
    /// run as in flight.
    pub async fn mark_processing(pool: &PgPool, id: MediaId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE media_records SET status_id = $2, updated_at = NOW() \
             WHERE id = $1 AND status_id = $3",
        )
        .bind(id)
        .bind(MediaStatus::Processing.id())
        .bind(MediaStatus::Pending.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a record completed with its artifact location.
    ///
    /// Guarded by the non-terminal condition: exactly one of any number of
    /// concurrent reconciliations wins; the rest observe `false`.
    pub async fn complete(
        pool: &PgPool,
        id: MediaId,
        output_url: &str,
        storage_path: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE media_records \
             SET status_id = $2, output_url = $3, storage_path = $4, updated_at = NOW() \
             WHERE id = $1 AND status_id NOT IN ($5, $6)",
        )
        .bind(id)
        .bind(MediaStatus::Completed.id())
        .bind(output_url)
        .bind(storage_path)
        .bind(TERMINAL_STATUSES[0])
        .bind(TERMINAL_STATUSES[1])
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a record failed with an error message. Same terminal guard as
    /// [`complete`](Self::complete).
    pub async fn fail(pool: &PgPool, id: MediaId, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE media_records \
             SET status_id = $2, error_message = $3, updated_at = NOW() \
             WHERE id = $1 AND status_id NOT IN ($4, $5)",
        )
        .bind(id)
        .bind(MediaStatus::Failed.id())
        .bind(error)
        .bind(TERMINAL_STATUSES[0])
        .bind(TERMINAL_STATUSES[1])
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stash a dispatch error in the metadata bag without changing status.
    ///
    /// The record stays pending and pollable; the stale sweep is the
    /// eventual remediation if the backend never acknowledges the run.
    pub async fn record_dispatch_error(
        pool: &PgPool,
        id: MediaId,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE media_records \
             SET metadata = jsonb_set(metadata, '{dispatch_error}', to_jsonb($2::text)), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a record by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: MediaId,
    ) -> Result<Option<MediaRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_records WHERE id = $1");
        sqlx::query_as::<_, MediaRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's records, newest first, with optional status filter.
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: DbId,
        params: &MediaListQuery,
    ) -> Result<Vec<MediaRecord>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let status_id = params
            .status
            .as_deref()
            .and_then(|s| match s {
                "pending" => Some(MediaStatus::Pending),
                "processing" => Some(MediaStatus::Processing),
                "completed" => Some(MediaStatus::Completed),
                "failed" => Some(MediaStatus::Failed),
                _ => None,
            })
            .map(MediaStatus::id);

        let query = format!(
            "SELECT {COLUMNS} FROM media_records \
             WHERE user_id = $1 AND ($2::SMALLINT IS NULL OR status_id = $2) \
             ORDER BY created_at DESC LIMIT $3"
        );
        sqlx::query_as::<_, MediaRecord>(&query)
            .bind(user_id)
            .bind(status_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Completed image-mode records with a non-empty output URL, newest
    /// first. Feeds the selectable-image listing.
    pub async fn list_completed_images(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<MediaRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM media_records \
             WHERE user_id = $1 AND mode_id = $2 AND status_id = $3 AND output_url <> '' \
             ORDER BY created_at DESC LIMIT $4"
        );
        sqlx::query_as::<_, MediaRecord>(&query)
            .bind(user_id)
            .bind(GenerationMode::Image.id())
            .bind(MediaStatus::Completed.id())
            .bind(DEFAULT_LIMIT)
            .fetch_all(pool)
            .await
    }

    /// Delete a record. Returns whether a row was removed.
    pub async fn delete(pool: &PgPool, id: MediaId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM media_records WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fail every non-terminal record created before `cutoff`.
    ///
    /// Used by the stale-media sweep; returns the number of rows flipped.
    pub async fn fail_stale(
        pool: &PgPool,
        cutoff: Timestamp,
        error: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE media_records \
             SET status_id = $2, error_message = $3, updated_at = NOW() \
             WHERE created_at < $1 AND status_id NOT IN ($4, $5)",
        )
        .bind(cutoff)
        .bind(MediaStatus::Failed.id())
        .bind(error)
        .bind(TERMINAL_STATUSES[0])
        .bind(TERMINAL_STATUSES[1])
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
