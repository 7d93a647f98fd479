use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::{
    auth::{SessionManager, TokenAuthority, parse_algorithm, tokens::DATA_SCOPE},
    clients::LogStorageClient,
    clock::{Clock, SystemClock},
    config::AppConfig,
    errors::ManagerError,
    proxy::AuthenticatedProxy,
    runtime::{ContainerRuntime, DockerRuntime},
    server::{ApiServer, AppState},
    services::{
        DashboardService, ReloadNotifier, TelemetryStore, VersionStateController,
    },
    storage::create_version_store,
};

/// Wire every service around the given container runtime and clock.
pub async fn build_app_state(
    config: &AppConfig,
    runtime: Arc<dyn ContainerRuntime>,
    clock: Arc<dyn Clock>,
) -> Result<AppState> {
    let auth = config.auth();
    let algorithm =
        parse_algorithm(&auth.jwt_algorithm).map_err(ManagerError::Config)?;

    let store = create_version_store(&config.storage());
    let versions = Arc::new(
        VersionStateController::open(store, runtime.clone(), config.slots())
            .await?,
    );

    if let Some(reload) = config.reload() {
        info!(url = %reload.url, "reverse proxy reload enabled");
        ReloadNotifier::new(&reload, config.slots())?.spawn(versions.subscribe());
    }

    let telemetry = Arc::new(TelemetryStore::new(clock.clone()));
    let tokens = Arc::new(TokenAuthority::new(
        &auth.jwt_secret,
        algorithm,
        auth.token_ttl,
        DATA_SCOPE,
        clock.clone(),
    ));
    let sessions = Arc::new(SessionManager::new(&auth, clock));
    let proxy = Arc::new(AuthenticatedProxy::new(
        tokens.clone(),
        versions.clone(),
        telemetry.clone(),
        config.backend_timeout(),
    )?);
    let log_storage = LogStorageClient::new(&config.log_storage())?;
    info!(url = %log_storage.base_url(), "log storage configured");
    let dashboard = Arc::new(DashboardService::new(
        versions.clone(),
        runtime,
        telemetry.clone(),
        log_storage.clone(),
        config.monitored_containers(),
    ));

    Ok(AppState {
        versions,
        telemetry,
        proxy,
        tokens,
        sessions,
        log_storage,
        dashboard,
    })
}

/// Build a fully-wired ApiServer backed by the Docker Engine API.
pub async fn build_api_server(config: AppConfig) -> Result<ApiServer> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let runtime = Arc::new(DockerRuntime::new(&config.runtime(), clock.clone())?);
    info!(docker = %runtime.base_url(), "container runtime configured");
    let state = build_app_state(&config, runtime, clock).await?;
    Ok(ApiServer::new(state, config.server()))
}

/// Build a fully-wired ApiServer from environment variables.
pub async fn build_api_server_from_env() -> Result<ApiServer> {
    build_api_server(AppConfig::load_from_env()?).await
}
