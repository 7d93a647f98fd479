use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    routing::{get, post},
};
use bgd_observability::ServiceHealth;
use tracing::info;

use crate::{
    api::{create_middleware_stack, handlers},
    auth::{SessionManager, TokenAuthority},
    clients::LogStorageClient,
    config::ServerConfig,
    proxy::AuthenticatedProxy,
    services::{DashboardService, TelemetryStore, VersionStateController},
};

#[derive(Clone)]
pub struct AppState {
    pub versions: Arc<VersionStateController>,
    pub telemetry: Arc<TelemetryStore>,
    pub proxy: Arc<AuthenticatedProxy>,
    pub tokens: Arc<TokenAuthority>,
    pub sessions: Arc<SessionManager>,
    pub log_storage: LogStorageClient,
    pub dashboard: Arc<DashboardService>,
}

pub struct ApiServer {
    app: Router,
    config: ServerConfig,
}

impl ApiServer {
    pub fn new(state: AppState, config: ServerConfig) -> Self {
        let app = Router::new()
            // Admin session
            .route(
                "/login",
                get(handlers::login_page).post(handlers::login),
            )
            .route("/logout", get(handlers::logout))
            .route("/get_token", get(handlers::get_token))
            // Admin console
            .route("/", get(handlers::dashboard))
            .route("/switch_version", post(handlers::switch_version))
            .route("/discard_old", post(handlers::discard_old))
            .route("/reset_log", post(handlers::reset_log))
            // Data plane, forwarded to the active backend
            .route(
                "/status",
                get(handlers::forward_to_active)
                    .post(handlers::forward_to_active),
            )
            .route(
                "/log",
                get(handlers::forward_to_active)
                    .post(handlers::forward_to_active),
            )
            // Health check endpoint
            .route("/health", get(health_check))
            .layer(create_middleware_stack())
            .with_state(state);

        Self { app, config }
    }

    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error>> {
        let ip = self.config.host.parse::<std::net::IpAddr>()?;
        let addr = SocketAddr::new(ip, self.config.port);
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Deployment manager listening on {}", addr);
        info!("Health check available at: http://{}/health", addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Deployment manager stopped");
        Ok(())
    }

    /// Consume and return the underlying Axum Router so callers can serve it
    /// themselves or drive it with `oneshot` in tests.
    pub fn into_router(self) -> Router {
        self.app
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn health_check() -> Json<ServiceHealth> {
    Json(ServiceHealth::healthy(
        "bgd-manager",
        env!("CARGO_PKG_VERSION"),
    ))
}
