use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::time::Duration;
use time::Duration as TimeDuration;
use tracing::warn;

use super::jwt::JwtKeys;
use crate::{
    error::AppError,
    users::{model::User, store::UserStore},
};

pub const TOKEN_COOKIE: &str = "token";

/// Session token from the `token` cookie, falling back to a bearer header
/// for non-browser clients.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(c) = CookieJar::from_headers(headers).get(TOKEN_COOKIE) {
        if !c.value().is_empty() {
            return Some(c.value().to_string());
        }
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Cookie lifetime matches the token lifetime `ttl`.
pub fn session_cookie(token: String, ttl: Duration, production: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(production)
        .same_site(if production {
            SameSite::Strict
        } else {
            SameSite::Lax
        })
        .max_age(TimeDuration::seconds(
            i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        ))
        .path("/")
        .build()
}

/// Overwrites the session cookie whether or not the client sent one.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .http_only(true)
        .max_age(TimeDuration::ZERO)
        .path("/")
        .build()
}

/// Verifies the token, then loads the user from the partition its role names.
pub async fn resolve_current_user(
    store: &dyn UserStore,
    keys: &JwtKeys,
    token: &str,
) -> Result<User, AppError> {
    let claims = keys.verify(token)?;
    match store.find_by_id(claims.user_id, claims.role).await? {
        Some(user) => Ok(user),
        None => {
            warn!(user_id = %claims.user_id, role = %claims.role, "token refers to a missing user");
            Err(AppError::UserNotFound)
        }
    }
}
