use axum::{extract::FromRequestParts, http::request::Parts, response::Redirect};
use tracing::debug;

use crate::{auth::Claims, server::AppState};

pub const LOGIN_PATH: &str = "/login";

/// An authenticated admin. Browsers without a valid session are sent to the
/// login page.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Claims);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .sessions
            .authenticate(&parts.headers)
            .map(AdminSession)
            .map_err(|e| {
                debug!(path = %parts.uri.path(), error = %e, "admin session required");
                Redirect::to(LOGIN_PATH)
            })
    }
}
