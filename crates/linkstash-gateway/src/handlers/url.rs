use super::parse_json;
use crate::error::{AppError, Result};
use crate::identity::UserId;
use crate::model::{ShortenRequest, ShortenResponse};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use linkstash_shortener::{BatchItem, Resolution, Shortened};
use tracing::debug;

fn created_or_conflict(shortened: &Shortened) -> StatusCode {
    if shortened.created {
        StatusCode::CREATED
    } else {
        StatusCode::CONFLICT
    }
}

/// `POST /` with the long URL as a plain-text body.
pub async fn shorten_text_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    body: Bytes,
) -> Result<Response> {
    let long_url =
        std::str::from_utf8(&body).map_err(|e| AppError::InvalidBody(e.to_string()))?;
    let shortened = state.shortener().shorten(long_url, user.as_str()).await?;

    Ok((created_or_conflict(&shortened), shortened.short_url).into_response())
}

/// `POST /api/shorten` with `{"url": "..."}`.
pub async fn shorten_json_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    body: Bytes,
) -> Result<Response> {
    let request: ShortenRequest = parse_json(&body)?;
    let shortened = state.shortener().shorten(&request.url, user.as_str()).await?;

    let status = created_or_conflict(&shortened);
    Ok((
        status,
        Json(ShortenResponse {
            result: shortened.short_url,
        }),
    )
        .into_response())
}

pub async fn shorten_batch_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserId>,
    body: Bytes,
) -> Result<Response> {
    let items: Vec<BatchItem> = parse_json(&body)?;
    let shortened = state
        .shortener()
        .shorten_batch(items, user.as_str())
        .await?;

    Ok((StatusCode::CREATED, Json(shortened)).into_response())
}

pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let response = match state.shortener().resolve(&id).await? {
        Resolution::Redirect(long_url) => Redirect::temporary(&long_url).into_response(),
        Resolution::Gone => StatusCode::GONE.into_response(),
        Resolution::NotFound => {
            debug!(id = %id, "unknown short id");
            (StatusCode::BAD_REQUEST, format!("unknown short id: {id}")).into_response()
        }
    };
    Ok(response)
}
