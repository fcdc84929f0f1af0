//! Web middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use ideavote_common::Config;
use ideavote_core::{AccessGate, IdeaService, VoteService};

use crate::session;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Idea submission and listing.
    pub idea_service: IdeaService,
    /// Vote allocation and quarter totals.
    pub vote_service: VoteService,
    /// Domain-restricted sign-in and session checks.
    pub access_gate: AccessGate,
    /// Loaded application configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// The quarter new ideas and votes belong to.
    #[must_use]
    pub fn current_quarter(&self) -> &str {
        &self.config.voting.current_quarter
    }

    /// Whether cookies must be marked `Secure`.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.config.server.url.starts_with("https://")
    }
}

/// Session middleware.
///
/// Resolves the session cookies to an allowed user through the access gate
/// and stores the user and the live session in the request extensions. Requests without a valid,
/// allowed session pass through anonymously. When the gate renewed an expired
/// session, the new tokens are written back unless the handler set its own.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let mut refreshed = None;

    if let Some(session) = session::from_jar(&jar) {
        match state.access_gate.current_user(&session).await {
            Ok(Some(active)) => {
                req.extensions_mut().insert(active.user);
                req.extensions_mut()
                    .insert(active.refreshed.clone().unwrap_or(session));
                refreshed = active.refreshed;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Session lookup failed"),
        }
    }

    let response = next.run(req).await;

    match refreshed {
        Some(session) if !sets_session_cookie(&response) => {
            let jar = session::store(CookieJar::new(), session, state.secure_cookies());
            (jar, response).into_response()
        }
        _ => response,
    }
}

/// Whether the handler already wrote (or cleared) the access token cookie.
fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{}=", session::ACCESS_TOKEN_COOKIE);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}
