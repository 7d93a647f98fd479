//! Bearer-gated forwarding to whichever slot is active at request time.
//!
//! One attempt per request; a timeout or refused connection is reported to
//! the caller as-is.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, error, warn};

use crate::{
    auth::{Claims, TokenAuthority, bearer_token},
    errors::{AuthError, ProxyError},
    services::{TelemetryStore, VersionStateController},
};

/// Backend reply relayed unchanged to the client.
#[derive(Debug)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for ForwardedResponse {
    fn into_response(self) -> Response {
        let mut resp = Response::new(Body::from(self.body));
        *resp.status_mut() = self.status;
        if let Some(ct) = self.content_type {
            resp.headers_mut().insert(CONTENT_TYPE, ct);
        }
        resp
    }
}

pub struct AuthenticatedProxy {
    client: Client,
    tokens: Arc<TokenAuthority>,
    versions: Arc<VersionStateController>,
    telemetry: Arc<TelemetryStore>,
}

impl AuthenticatedProxy {
    pub fn new(
        tokens: Arc<TokenAuthority>,
        versions: Arc<VersionStateController>,
        telemetry: Arc<TelemetryStore>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .tcp_nodelay(true)
            .build()?;
        Ok(Self {
            client,
            tokens,
            versions,
            telemetry,
        })
    }

    /// Checks the bearer credential. Runs before the request body is read.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let token = bearer_token(headers)?;
        self.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "bearer token rejected");
            e
        })
    }

    /// Resolves the active slot and relays an authorized request to its
    /// `endpoint`. Telemetry is only touched once the backend has answered.
    #[tracing::instrument(skip(self, claims, headers, body), fields(subject = %claims.sub))]
    pub async fn relay(
        &self,
        claims: &Claims,
        endpoint: &str,
        method: Method,
        headers: &HeaderMap,
        query: Option<&str>,
        body: Bytes,
    ) -> Result<ForwardedResponse, ProxyError> {
        let active = self.versions.current_active().await?;
        let target = self.versions.slots().target(active);
        let query = query.map(|q| format!("?{}", q)).unwrap_or_default();
        let url = format!("{}/{}{}", target.url, endpoint, query);
        debug!(slot = %active, "Proxying request to: {}", url);

        let mut req = self.client.request(method, &url);
        if let Some(ct) = headers.get(CONTENT_TYPE) {
            req = req.header(CONTENT_TYPE, ct);
        }
        if !body.is_empty() {
            req = req.body(body);
        }

        let started = Instant::now();
        let unavailable = |e: reqwest::Error| {
            error!(
                slot = %active,
                "Failed to proxy request to backend: {} (timeout={}, connect={}, source={:?})",
                e,
                e.is_timeout(),
                e.is_connect(),
                e.source()
            );
            ProxyError::BackendUnavailable(format!(
                "Backend '{}' ({}) unavailable: {}",
                active, target.container, e
            ))
        };
        let resp = req.send().await.map_err(&unavailable)?;
        let status = resp.status();
        let content_type = resp.headers().get(CONTENT_TYPE).cloned();
        let body = resp.bytes().await.map_err(&unavailable)?;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.telemetry.record_latency(endpoint, elapsed_ms);
        self.telemetry.mark_alive_now(&target.container);
        if status.is_server_error() {
            warn!(slot = %active, %status, "backend answered with server error");
        }

        Ok(ForwardedResponse {
            status,
            content_type,
            body,
        })
    }
}
