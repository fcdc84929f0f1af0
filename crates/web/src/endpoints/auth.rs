//! Sign-in, callback and sign-out.

use axum::{
    Extension, Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use ideavote_core::{CallbackOutcome, Session, SignInOutcome};
use serde::Deserialize;

use super::redirect_with;
use crate::{middleware::AppState, session};

/// Email sign-in form.
#[derive(Debug, Default, Deserialize)]
pub struct SignInForm {
    pub email: Option<String>,
}

/// Request a one-time sign-in link.
async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> Response {
    let email = form.email.unwrap_or_default();

    match state.access_gate.request_sign_in(&email).await {
        SignInOutcome::Sent { code_verifier } => {
            let jar = session::store_verifier(jar, code_verifier, state.secure_cookies());
            (jar, Redirect::to("/?sent=1")).into_response()
        }
        SignInOutcome::Denied => Redirect::to("/?denied=1").into_response(),
        SignInOutcome::Failed(message) => redirect_with("/", "err", &message).into_response(),
    }
}

/// OAuth sign-in form.
#[derive(Debug, Default, Deserialize)]
pub struct OAuthForm {
    pub provider: Option<String>,
}

/// Start an OAuth sign-in with the configured (or requested) provider.
async fn oauth(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<OAuthForm>,
) -> Response {
    match state.access_gate.begin_oauth(form.provider.as_deref()).await {
        Ok(start) => {
            let jar = session::store_verifier(jar, start.code_verifier, state.secure_cookies());
            (jar, Redirect::to(start.authorize_url.as_str())).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "OAuth sign-in could not start");
            Redirect::to("/").into_response()
        }
    }
}

/// Callback parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error_description: Option<String>,
}

/// Finish sign-in from the emailed link or OAuth round trip.
async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> (CookieJar, Redirect) {
    let (jar, verifier) = session::take_verifier(jar);

    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return match query.error_description {
            Some(description) => (jar, redirect_with("/", "err", &description)),
            None => (jar, Redirect::to("/")),
        };
    };
    let Some(verifier) = verifier else {
        return (
            jar,
            redirect_with("/", "err", "Sign-in link expired, request a new one"),
        );
    };

    match state.access_gate.complete_sign_in(&code, &verifier).await {
        CallbackOutcome::Authenticated { session, .. } => (
            session::store(jar, session, state.secure_cookies()),
            Redirect::to("/lab"),
        ),
        CallbackOutcome::Denied => (session::clear(jar), Redirect::to("/?denied=1")),
        CallbackOutcome::Failed(message) => (jar, redirect_with("/", "err", &message)),
    }
}

/// Sign out at the provider and drop the session cookies.
///
/// Prefers the session the middleware resolved, which may have been renewed.
async fn signout(
    State(state): State<AppState>,
    live: Option<Extension<Session>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let current = live
        .map(|Extension(live)| live)
        .or_else(|| session::from_jar(&jar));

    if let Some(current) = current
        && let Err(e) = state.access_gate.sign_out(&current).await
    {
        tracing::warn!(error = %e, "Provider sign-out failed");
    }

    (session::clear(jar), Redirect::to("/"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signin", post(signin))
        .route("/oauth", post(oauth))
        .route("/callback", get(callback))
        .route("/signout", post(signout))
}
