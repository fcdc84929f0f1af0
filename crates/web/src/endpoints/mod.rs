//! Page and form endpoints.

mod auth;
mod ideas;
mod pages;
mod votes;

use axum::{Router, response::Redirect};

use crate::middleware::AppState;

/// Create the application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(pages::router())
        .merge(ideas::router())
        .merge(votes::router())
        .nest("/auth", auth::router())
}

/// `303 See Other` to `path` with `key` set to the encoded `message`.
fn redirect_with(path: &str, key: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{path}?{key}={}", urlencoding::encode(message)))
}
