//! HTTP implementation of [`RenderBackend`] using [`reqwest`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tini_core::media::GenerationMode;

use crate::{DispatchRequest, RenderBackend, RenderError, RunState};

/// Timeout applied to dispatch and status-query calls. A slow backend
/// must not stall the serving task indefinitely.
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for downloading a finished artifact (videos can be large).
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the rendering backend, loaded from the environment.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Base HTTP URL of the backend API.
    pub api_url: String,
    /// Bearer token for the backend API.
    pub api_key: String,
    /// Deployment id used for image runs.
    pub image_deployment_id: String,
    /// Deployment id used for video runs.
    pub video_deployment_id: String,
    /// Deployment id used for first/last-frame video runs.
    pub frame_video_deployment_id: String,
}

impl RenderConfig {
    /// Load backend configuration from environment variables.
    ///
    /// | Env Var                        | Required |
    /// |--------------------------------|----------|
    /// | `RENDER_API_URL`               | **yes**  |
    /// | `RENDER_API_KEY`               | **yes**  |
    /// | `RENDER_IMAGE_DEPLOYMENT`      | **yes**  |
    /// | `RENDER_VIDEO_DEPLOYMENT`      | **yes**  |
    /// | `RENDER_FRAME_VIDEO_DEPLOYMENT`| **yes**  |
    ///
    /// # Panics
    ///
    /// Panics when a required variable is missing; misconfiguration should
    /// fail at startup, not at first dispatch.
    pub fn from_env() -> Self {
        let require = |name: &str| {
            std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set"))
        };
        Self {
            api_url: require("RENDER_API_URL"),
            api_key: require("RENDER_API_KEY"),
            image_deployment_id: require("RENDER_IMAGE_DEPLOYMENT"),
            video_deployment_id: require("RENDER_VIDEO_DEPLOYMENT"),
            frame_video_deployment_id: require("RENDER_FRAME_VIDEO_DEPLOYMENT"),
        }
    }

    /// Deployment id for a generation mode.
    pub fn deployment_for(&self, mode: GenerationMode) -> &str {
        match mode {
            GenerationMode::Image => &self.image_deployment_id,
            GenerationMode::Video => &self.video_deployment_id,
            GenerationMode::FirstLastFrameVideo => &self.frame_video_deployment_id,
        }
    }
}

/// Response returned by the backend's `/run` endpoint after queueing.
#[derive(Debug, Deserialize)]
struct DispatchResponse {
    run_id: String,
}

/// Response returned by the backend's run-status endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    output_url: Option<String>,
    error: Option<String>,
}

/// [`RenderBackend`] implementation speaking the backend's HTTP API.
pub struct TiniRenderClient {
    client: reqwest::Client,
    download_client: reqwest::Client,
    config: RenderConfig,
}

impl TiniRenderClient {
    /// Create a client for the configured backend.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialised (startup-time only).
    pub fn new(config: RenderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(API_TIMEOUT)
            .build()
            .expect("failed to build render HTTP client");
        let download_client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .expect("failed to build render download client");
        Self {
            client,
            download_client,
            config,
        }
    }

    /// Turn a non-2xx response into [`RenderError::Api`], otherwise
    /// deserialize the JSON body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RenderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        response.json::<T>().await.map_err(RenderError::from)
    }
}

#[async_trait]
impl RenderBackend for TiniRenderClient {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<String, RenderError> {
        let mut inputs = serde_json::json!({
            "prompt": request.prompt,
            "media_type": request.mode.media_type(),
            "generation_mode": request.mode.as_str(),
            "media_id": request.media_id,
        });
        if let Some(ref url) = request.start_image_url {
            inputs["start_image_url"] = serde_json::json!(url);
        }
        if let Some(ref url) = request.end_image_url {
            inputs["end_image_url"] = serde_json::json!(url);
        }

        let body = serde_json::json!({
            "deployment_id": self.config.deployment_for(request.mode),
            "inputs": inputs,
        });

        let response = self
            .client
            .post(format!("{}/run", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: DispatchResponse = Self::parse_response(response).await?;

        tracing::info!(
            media_id = %request.media_id,
            run_id = %parsed.run_id,
            mode = request.mode.as_str(),
            "Run queued on rendering backend",
        );

        Ok(parsed.run_id)
    }

    async fn run_status(&self, run_id: &str) -> Result<RunState, RenderError> {
        let response = self
            .client
            .get(format!("{}/run/{run_id}", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        let parsed: StatusResponse = Self::parse_response(response).await?;

        match parsed.status.as_str() {
            "queued" | "not-started" => Ok(RunState::Queued),
            "running" | "uploading" => Ok(RunState::Running),
            "success" => {
                let output_url = parsed.output_url.ok_or_else(|| {
                    RenderError::Malformed(format!(
                        "run {run_id} reported success without an output_url"
                    ))
                })?;
                Ok(RunState::Succeeded { output_url })
            }
            "failed" | "timeout" | "cancelled" => Ok(RunState::Failed {
                error: parsed
                    .error
                    .unwrap_or_else(|| format!("run ended with status '{}'", parsed.status)),
            }),
            other => Err(RenderError::Malformed(format!(
                "unknown run status '{other}'"
            ))),
        }
    }

    async fn fetch_output(&self, output_url: &str) -> Result<Vec<u8>, RenderError> {
        let response = self.download_client.get(output_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
