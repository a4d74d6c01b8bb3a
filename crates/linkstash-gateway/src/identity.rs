//! Cookie-carried user identity.
//!
//! Every request is attributed to a user id stored in the `Authorization`
//! cookie. Requests without one get a fresh UUID, which is sent back with
//! `Set-Cookie`; a cookie that is not a UUID is rejected.

use crate::error::AppError;
use axum::extract::Request;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;
use uuid::Uuid;

pub const USER_COOKIE: &str = "Authorization";

/// The caller's user id, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub async fn assign_user_id(mut request: Request, next: Next) -> Response {
    if let Some(value) = cookie_value(request.headers(), USER_COOKIE) {
        if Uuid::parse_str(&value).is_err() {
            return AppError::InvalidUser(value).into_response();
        }
        request.extensions_mut().insert(UserId(value));
        return next.run(request).await;
    }

    let user = Uuid::new_v4().to_string();
    debug!(user_id = %user, "issuing new user id");
    request.extensions_mut().insert(UserId(user.clone()));

    let mut response = next.run(request).await;
    if let Ok(cookie) = HeaderValue::from_str(&format!("{USER_COOKIE}={user}; Path=/")) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}
