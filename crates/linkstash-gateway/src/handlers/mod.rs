mod health;
mod url;
mod user;

pub use health::ping_handler;
pub use url::{
    redirect_handler, shorten_batch_handler, shorten_json_handler, shorten_text_handler,
};
pub use user::{delete_user_urls_handler, user_urls_handler};

use crate::error::{AppError, Result};
use axum::body::Bytes;
use serde::de::DeserializeOwned;

/// Decodes a JSON body regardless of its `Content-Type`; any failure is a 400.
fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| AppError::InvalidBody(e.to_string()))
}
