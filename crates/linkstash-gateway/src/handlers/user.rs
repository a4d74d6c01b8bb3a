use super::parse_json;
use crate::error::Result;
use crate::identity::UserId;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

pub async fn user_urls_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
) -> Result<Response> {
    let urls = state.shortener().user_urls(user.as_str()).await?;
    if urls.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(urls).into_response())
}

/// Accepts a JSON array of short ids. The deletion runs in the background;
/// `202` only means the batch was queued.
pub async fn delete_user_urls_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    body: Bytes,
) -> Result<StatusCode> {
    let ids: Vec<String> = parse_json(&body)?;
    state.shortener().delete(ids, user.as_str()).await?;
    Ok(StatusCode::ACCEPTED)
}
