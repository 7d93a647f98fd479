use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{api::LOGIN_PATH, errors::ApiError, server::AppState};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
}

const LOGIN_FORM: &str = r#"<!doctype html>
<title>Login</title>
<form method="post" action="/login">
  <input name="username" placeholder="username">
  <input name="password" type="password" placeholder="password">
  <button type="submit">Login</button>
</form>
"#;

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_FORM)
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.sessions.login(&form.username, &form.password) {
        Ok(session) => {
            info!(user = %form.username, "admin logged in");
            (
                AppendHeaders([(SET_COOKIE, state.sessions.set_cookie(&session))]),
                Redirect::to("/"),
            )
                .into_response()
        }
        Err(e) => {
            warn!(user = %form.username, "admin login failed");
            e.into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, state.sessions.clear_cookie())]),
        Redirect::to(LOGIN_PATH),
    )
}

/// Issues a data-plane bearer token to the logged-in admin.
pub async fn get_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let admin = state.sessions.authenticate(&headers).map_err(|e| {
        ApiError::Unauthorized(format!("admin session required: {}", e))
    })?;
    let issued = state
        .tokens
        .issue(&admin.sub)
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;
    info!(admin = %admin.sub, expires_at = %issued.expires_at, "bearer token issued");
    Ok(Json(TokenResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_in: state.tokens.ttl().num_seconds(),
        expires_at: issued.expires_at,
    }))
}
