//! Vote allocation.

use axum::{
    Form, Router,
    extract::State,
    response::Redirect,
    routing::post,
};
use ideavote_core::parse_vote_count;
use serde::Deserialize;

use super::redirect_with;
use crate::{extractors::AuthUser, middleware::AppState};

/// Vote form fields. The idea may arrive as `idea_id` or `ideaId`.
#[derive(Debug, Default, Deserialize)]
pub struct VoteForm {
    pub idea_id: Option<String>,
    #[serde(rename = "ideaId")]
    pub idea_id_camel: Option<String>,
    pub quarter: Option<String>,
    pub votes: Option<String>,
}

impl VoteForm {
    fn idea_id(&self) -> &str {
        self.idea_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .or(self.idea_id_camel.as_deref())
            .unwrap_or_default()
    }
}

/// Set the user's allocation for one idea and return to the voting page.
async fn set_votes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<VoteForm>,
) -> Redirect {
    let result = match parse_vote_count(form.votes.as_deref()) {
        Ok(votes) => {
            state
                .vote_service
                .set_votes(
                    &user.id,
                    form.idea_id(),
                    form.quarter.as_deref().unwrap_or_default(),
                    votes,
                )
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Redirect::to("/lab"),
        Err(e) => redirect_with("/lab", "vote_err", &e.user_message()),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/vote", post(set_votes))
}
