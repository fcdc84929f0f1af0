//! Idea submission.

use axum::{
    Form, Router,
    extract::State,
    response::Redirect,
    routing::post,
};
use ideavote_common::AppError;
use ideavote_core::SubmitIdeaInput;
use serde::Deserialize;

use super::redirect_with;
use crate::{extractors::AuthUser, middleware::AppState};

/// Idea form fields.
#[derive(Debug, Default, Deserialize)]
pub struct IdeaForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub data_gaps: Option<String>,
    pub quarter: Option<String>,
}

/// Create an idea and return to the voting page.
async fn submit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Form(form): Form<IdeaForm>,
) -> Redirect {
    let input = SubmitIdeaInput {
        title: form.title,
        description: form.description,
        category: form.category,
        data_gaps: form.data_gaps,
        quarter: form.quarter,
    };

    match state.idea_service.submit(input).await {
        Ok(idea) => {
            tracing::debug!(user_id = %user.id, idea_id = %idea.id, "Idea submitted");
            Redirect::to("/lab")
        }
        Err(AppError::Validation(_)) => Redirect::to("/lab?err=missing"),
        Err(e) => {
            tracing::error!(user_id = %user.id, error = %e, "Idea submission failed");
            redirect_with("/lab", "err", &e.user_message())
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/idea", post(submit))
}
