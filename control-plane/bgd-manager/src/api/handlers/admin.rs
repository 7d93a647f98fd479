use axum::{extract::State, response::Redirect};
use tracing::{error, info, warn};

use crate::{
    api::AdminSession, errors::ApiError, server::AppState,
    services::DiscardOutcome,
};

pub async fn switch_version(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
) -> Result<Redirect, ApiError> {
    match state.versions.toggle().await {
        Ok(active) => {
            info!(admin = %admin.sub, active = %active, "API: version switched");
            Ok(Redirect::to("/"))
        }
        Err(e) => {
            error!("Failed to switch version: {}", e);
            Err(ApiError::InternalServerError(format!(
                "Failed to switch version: {}",
                e
            )))
        }
    }
}

pub async fn discard_old(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
) -> Result<Redirect, ApiError> {
    match state.versions.discard_inactive().await? {
        DiscardOutcome::Stopped(name) => {
            info!(admin = %admin.sub, container = %name, "API: inactive instance discarded");
        }
        DiscardOutcome::NotFound(name) => {
            info!(admin = %admin.sub, container = %name, "API: inactive instance already gone");
        }
    }
    Ok(Redirect::to("/"))
}

pub async fn reset_log(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
) -> Redirect {
    match state.log_storage.reset().await {
        Ok(()) => info!(admin = %admin.sub, "API: log reset"),
        Err(e) => warn!(error = %e, "log reset failed"),
    }
    Redirect::to("/")
}
