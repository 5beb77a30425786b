use std::sync::Arc;

use tini_render::RenderBackend;
use tini_storage::ObjectStore;

use crate::billing::BillingProvider;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: tini_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Remote rendering backend (dispatch + status queries).
    pub render: Arc<dyn RenderBackend>,
    /// Artifact store gateway.
    pub storage: Arc<dyn ObjectStore>,
    /// Billing provider (checkout and portal sessions).
    pub billing: Arc<dyn BillingProvider>,
}
