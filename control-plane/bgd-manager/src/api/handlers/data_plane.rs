use axum::extract::{Request, State};

use crate::{errors::ProxyError, proxy::ForwardedResponse, server::AppState};

pub const MAX_FORWARD_BODY_BYTES: usize = 10 * 1024 * 1024;

/// `/{endpoint}` on this service maps to `/{endpoint}` on the active backend.
/// The bearer token is checked before any of the body is buffered.
pub async fn forward_to_active(
    State(state): State<AppState>,
    request: Request,
) -> Result<ForwardedResponse, ProxyError> {
    let (parts, body) = request.into_parts();
    let claims = state.proxy.authorize(&parts.headers)?;

    let endpoint = parts.uri.path().trim_start_matches('/');
    let body = axum::body::to_bytes(body, MAX_FORWARD_BODY_BYTES)
        .await
        .map_err(|e| ProxyError::Body(e.to_string()))?;
    state
        .proxy
        .relay(
            &claims,
            endpoint,
            parts.method,
            &parts.headers,
            parts.uri.query(),
            body,
        )
        .await
}
