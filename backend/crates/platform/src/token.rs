//! Session token extraction
//!
//! The browser client sends its session token either as
//! `Authorization: Bearer <token>` or in a `token` cookie.

use axum::http::{HeaderMap, header};

/// Cookie that carries the session token when no Authorization header is sent
pub const SESSION_COOKIE_NAME: &str = "token";

/// Extract a cookie value from headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;

            if key == name {
                Some(value.to_string())
            } else {
                None
            }
        })
}

/// Extract the token from an `Authorization: Bearer` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Bearer header first, then the session cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    extract_bearer_token(headers)
        .or_else(|| extract_cookie(headers, SESSION_COOKIE_NAME))
        .filter(|t| !t.is_empty())
}
