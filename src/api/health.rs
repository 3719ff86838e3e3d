//! Health endpoint.

use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use super::{success, ApiResult};
use crate::broadcast::DeviceInfo;
use crate::AppState;

/// Server liveness and connection summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub connected_devices: usize,
    pub devices: Vec<DeviceInfo>,
}

/// GET /api/health - Liveness plus connected device count.
pub async fn health(State(state): State<AppState>) -> ApiResult<HealthStatus> {
    let revision_id = state.repo.revision().await;
    let devices = state.hub.devices();

    success(
        HealthStatus {
            status: "ok",
            timestamp: Utc::now().to_rfc3339(),
            connected_devices: devices.len(),
            devices,
        },
        revision_id,
    )
}
