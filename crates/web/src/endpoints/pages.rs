//! Home and voting pages.

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use ideavote_common::AppResult;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    render::{self, HomeView, LabView},
};

/// Status flags on the home page.
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    /// `1` after a sign-in link was sent.
    pub sent: Option<String>,
    /// `1` after an email outside the allowed domain was refused.
    pub denied: Option<String>,
    /// Sign-in error message.
    pub err: Option<String>,
}

/// Sign-in page; signed-in users go straight to voting.
async fn home(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Query(query): Query<HomeQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to("/lab").into_response();
    }

    let view = HomeView {
        sent: query.sent.as_deref() == Some("1"),
        denied: query.denied.as_deref() == Some("1"),
        error: query.err.as_deref().filter(|e| !e.is_empty()),
        allowed_domain: state.access_gate.policy().domain(),
    };
    Html(render::home_page(&view)).into_response()
}

/// Errors carried back from the idea and vote forms.
#[derive(Debug, Default, Deserialize)]
pub struct LabQuery {
    /// `missing` or the store message from a failed idea submission.
    pub err: Option<String>,
    /// Why the last vote was not saved.
    pub vote_err: Option<String>,
}

/// Ideas, totals and the user's allocation for the current quarter.
async fn lab(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<LabQuery>,
) -> AppResult<Html<String>> {
    let quarter = state.current_quarter();
    let ideas = state.idea_service.list_for_quarter(quarter).await?;
    let ballot = state.vote_service.ballot(&user.id, quarter).await?;

    let view = LabView {
        email: &user.email,
        quarter,
        ideas: &ideas,
        ballot: &ballot,
        error: query.err.as_deref().filter(|e| !e.is_empty()),
        vote_error: query.vote_err.as_deref().filter(|e| !e.is_empty()),
    };
    Ok(Html(render::lab_page(&view)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/lab", get(lab))
}
