//! Media record entity models and DTOs for the generation workflow.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tini_core::types::{DbId, MediaId, Timestamp};

use super::status::{MediaStatus, StatusId};

/// A row from the `media_records` table.
///
/// One row per generation request. Mutated only by the status reconciler
/// (status, output fields, metadata) or removed by a user-initiated delete.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MediaRecord {
    pub id: MediaId,
    pub user_id: DbId,
    /// 1 = image, 2 = video, 3 = first/last-frame video.
    pub mode_id: StatusId,
    pub prompt: String,
    pub start_image_url: Option<String>,
    pub end_image_url: Option<String>,
    pub status_id: StatusId,
    /// Correlation id assigned by the rendering backend. Attached shortly
    /// after creation; may be briefly absent.
    pub run_id: Option<String>,
    pub output_url: String,
    pub storage_path: String,
    /// Cost snapshot taken at submission time.
    pub credits_charged: i64,
    pub error_message: Option<String>,
    /// Transient operational fields only (e.g. dispatch error detail).
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MediaRecord {
    /// Decode the status column. Unknown ids map to `Failed` defensively
    /// but cannot occur through the repository API.
    pub fn status(&self) -> MediaStatus {
        MediaStatus::from_id(self.status_id).unwrap_or(MediaStatus::Failed)
    }
}

/// Insert payload assembled by the submission handler after validation.
#[derive(Debug)]
pub struct NewMediaRecord<'a> {
    pub user_id: DbId,
    pub mode_id: StatusId,
    pub prompt: &'a str,
    pub start_image_url: Option<&'a str>,
    pub end_image_url: Option<&'a str>,
    pub credits_charged: i64,
}

/// Query parameters for `GET /media`.
#[derive(Debug, Deserialize)]
pub struct MediaListQuery {
    /// Filter by wire status name (`pending`, `processing`, ...).
    pub status: Option<String>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
}

/// One entry of `GET /media/selectable-images`: a previously generated
/// output or a previously uploaded input, keyed by public URL.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SelectableImage {
    /// Public URL of the image.
    pub value: String,
    /// Display label (`Gen: <prompt...>` or `Input: <file name>`).
    pub label: String,
    /// `generated` or `input`.
    pub kind: &'static str,
}
