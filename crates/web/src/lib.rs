//! HTTP layer for ideavote.
//!
//! Server-rendered pages and HTML form handlers:
//!
//! - **Pages**: sign-in home page and the quarter's idea listing
//! - **Forms**: idea submission, vote allocation, sign-in/sign-out
//! - **Middleware**: per-request session resolution through the access gate
//!
//! Every form handler answers with a `303 See Other` back to a page, carrying
//! any error in the query string.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod render;
pub mod session;

use axum::{Router, middleware::from_fn_with_state};
use tower_http::trace::TraceLayer;

pub use endpoints::router;
pub use middleware::AppState;

/// Build the application with session resolution and request tracing.
pub fn app(state: AppState) -> Router {
    router()
        .layer(from_fn_with_state(state.clone(), middleware::session_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
