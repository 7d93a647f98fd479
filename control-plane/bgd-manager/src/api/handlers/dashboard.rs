use axum::{Json, extract::State};
use tracing::error;

use crate::{
    api::AdminSession, errors::ApiError, server::AppState,
    services::dashboard::DashboardSnapshot,
};

pub async fn dashboard(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    state.dashboard.snapshot().await.map(Json).map_err(|e| {
        error!("Failed to build dashboard: {}", e);
        ApiError::from(e)
    })
}
