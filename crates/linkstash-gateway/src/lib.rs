//! HTTP gateway for linkstash.
//!
//! Thin axum layer over [`ShortenerService`](linkstash_shortener::ShortenerService):
//! it extracts the user identity from a cookie, decodes request bodies and
//! maps service outcomes onto status codes.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
