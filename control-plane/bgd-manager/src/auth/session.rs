use std::sync::Arc;

use http::{HeaderMap, header::COOKIE};
use jsonwebtoken::Algorithm;

use super::tokens::{Claims, TokenAuthority};
use crate::{clock::Clock, config::AuthConfig, errors::AuthError};

pub const SESSION_COOKIE: &str = "bgd_session";
pub const SESSION_SCOPE: &str = "session";

/// Admin login and the signed session cookie that follows it.
pub struct SessionManager {
    authority: TokenAuthority,
    username: String,
    password: String,
    max_age_secs: i64,
}

impl SessionManager {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            authority: TokenAuthority::new(
                &config.session_secret,
                Algorithm::HS256,
                config.session_ttl,
                SESSION_SCOPE,
                clock,
            ),
            username: config.admin_username.clone(),
            password: config.admin_password.clone(),
            max_age_secs: config.session_ttl.as_secs() as i64,
        }
    }

    /// Validates admin credentials and returns a signed session value.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        // evaluate both so timing does not reveal which one was wrong
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        if !(user_ok & pass_ok) {
            return Err(AuthError::BadCredentials);
        }
        Ok(self.authority.issue(username)?.token)
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let value = session_cookie_value(headers).ok_or(AuthError::MissingSession)?;
        self.authority.verify(value)
    }

    pub fn set_cookie(&self, session: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, session, self.max_age_secs
        )
    }

    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    }
}

fn session_cookie_value(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
