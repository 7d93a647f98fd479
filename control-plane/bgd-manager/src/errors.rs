use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bgd_state_storage::StorageError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("State storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Container runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Instance not found: {0}")]
    NotFound(String),

    #[error("Runtime request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Runtime responded with status {0}: {1}")]
    Status(reqwest::StatusCode, String),

    #[error("Runtime request timed out")]
    Timeout,
}

impl RuntimeError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RuntimeError::Timeout
        } else {
            RuntimeError::Request(e)
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingCredential,

    #[error("missing admin session")]
    MissingSession,

    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("invalid username or password")]
    BadCredentials,

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = match &self {
            AuthError::MissingCredential => json!({ "error": "missing bearer token" }),
            AuthError::MissingSession => json!({ "error": "missing admin session" }),
            AuthError::Expired => json!({ "error": "token expired" }),
            AuthError::Invalid(detail) => {
                json!({ "error": "invalid token", "detail": detail })
            }
            AuthError::BadCredentials => {
                json!({ "error": "invalid username or password" })
            }
            AuthError::Signing(_) => {
                return ApiError::InternalServerError(self.to_string())
                    .into_response();
            }
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    BackendUnavailable(String),

    #[error("Cannot resolve active version: {0}")]
    State(#[from] StorageError),

    #[error("Failed to read request body: {0}")]
    Body(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::Auth(e) => e.into_response(),
            ProxyError::BackendUnavailable(msg) => {
                ApiError::BadGateway(msg).into_response()
            }
            ProxyError::State(e) => {
                ApiError::InternalServerError(e.to_string()).into_response()
            }
            ProxyError::Body(msg) => ApiError::BadRequest(msg).into_response(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),
}

impl From<ManagerError> for ApiError {
    fn from(value: ManagerError) -> Self {
        match value {
            ManagerError::Runtime(RuntimeError::NotFound(name)) => {
                ApiError::NotFound(format!("Instance not found: {}", name))
            }
            ManagerError::Runtime(e) => ApiError::BadGateway(e.to_string()),
            ManagerError::Collaborator(msg) => ApiError::BadGateway(msg),
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
