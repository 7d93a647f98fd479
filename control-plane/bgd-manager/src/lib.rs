pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod clients;
pub mod clock;
pub mod config;
pub mod errors;
pub mod proxy;
pub mod runtime;
pub mod server;
pub mod services;
pub mod storage;

pub use bootstrap::{build_api_server, build_api_server_from_env, build_app_state};
pub use config::AppConfig;
pub use errors::{ApiError, AuthError, ManagerError, ProxyError, RuntimeError};
pub use server::{ApiServer, AppState};
