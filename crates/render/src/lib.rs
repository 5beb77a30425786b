//! Client for the remote rendering backend.
//!
//! Generation jobs run on an external compute service: a dispatch call
//! queues a run against the deployment for a generation mode and returns
//! a correlation id (`run_id`); a separate query-by-run-id call reports
//! execution state and, on success, a retrievable output reference.
//!
//! [`RenderBackend`] is the seam the API layer depends on, so tests can
//! substitute a scripted backend for the HTTP client.

mod client;

pub use client::{RenderConfig, TiniRenderClient};

use async_trait::async_trait;
use tini_core::media::GenerationMode;
use tini_core::types::MediaId;

/// Payload for dispatching one generation run.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Local media record id, echoed back by the backend for correlation.
    pub media_id: MediaId,
    pub mode: GenerationMode,
    pub prompt: String,
    /// Reference images for first/last-frame runs.
    pub start_image_url: Option<String>,
    pub end_image_url: Option<String>,
}

/// Execution state of a dispatched run as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Accepted but not yet started.
    Queued,
    /// Actively rendering.
    Running,
    /// Finished; `output_url` points at the produced artifact on the
    /// backend's side (it still needs materializing into our storage).
    Succeeded { output_url: String },
    /// Finished unsuccessfully with a backend-reported reason.
    Failed { error: String },
}

/// Errors from the rendering backend boundary.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Render backend error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The backend returned a body this client could not interpret.
    #[error("Unexpected backend response: {0}")]
    Malformed(String),
}

/// Boundary trait for the remote compute service.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Queue a run and return its correlation id. The caller must not
    /// block on run completion -- this only acknowledges queueing.
    async fn dispatch(&self, request: &DispatchRequest) -> Result<String, RenderError>;

    /// Query the current execution state of a run.
    async fn run_status(&self, run_id: &str) -> Result<RunState, RenderError>;

    /// Download the produced artifact bytes from a backend output URL.
    async fn fetch_output(&self, output_url: &str) -> Result<Vec<u8>, RenderError>;
}
