//! In-memory identity provider for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ideavote_common::{AppError, AppResult};
use url::Url;

use crate::services::identity::{AuthenticatedUser, IdentityProvider, Session};

/// Identity provider with a fixed set of sessions and callback codes.
///
/// Counts how often it was asked to send links and to sign out, so callers can
/// check that denied requests never reached it.
#[derive(Debug, Default)]
pub struct FakeIdentityProvider {
    users: HashMap<String, AuthenticatedUser>,
    codes: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    link_error: Option<String>,
    link_requests: AtomicUsize,
    refreshes: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl FakeIdentityProvider {
    /// Provider with no sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session token for a user.
    #[must_use]
    pub fn with_user(mut self, access_token: &str, id: &str, email: &str) -> Self {
        self.users.insert(
            access_token.to_string(),
            AuthenticatedUser {
                id: id.to_string(),
                email: email.to_string(),
            },
        );
        self
    }

    /// Register a callback code that exchanges into `access_token`.
    #[must_use]
    pub fn with_code(mut self, code: &str, access_token: &str) -> Self {
        self.codes
            .insert(code.to_string(), access_token.to_string());
        self
    }

    /// Register a refresh token that renews into `access_token`.
    #[must_use]
    pub fn with_refresh(mut self, refresh_token: &str, access_token: &str) -> Self {
        self.refresh_tokens
            .insert(refresh_token.to_string(), access_token.to_string());
        self
    }

    /// Make every link request fail with `message`.
    #[must_use]
    pub fn failing_links(mut self, message: &str) -> Self {
        self.link_error = Some(message.to_string());
        self
    }

    /// Number of link requests received.
    pub fn link_requests(&self) -> usize {
        self.link_requests.load(Ordering::SeqCst)
    }

    /// Number of session refreshes received.
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Number of sign-outs received.
    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn request_one_time_link(
        &self,
        _email: &str,
        _redirect_url: &Url,
        _code_challenge: &str,
    ) -> AppResult<()> {
        self.link_requests.fetch_add(1, Ordering::SeqCst);
        match &self.link_error {
            Some(message) => Err(AppError::IdentityProvider(message.clone())),
            None => Ok(()),
        }
    }

    async fn oauth_redirect(
        &self,
        provider: &str,
        redirect_url: &Url,
        code_challenge: &str,
    ) -> AppResult<Url> {
        let mut url = Url::parse("https://identity.test/authorize")
            .map_err(|e| AppError::Internal(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_url.as_str())
            .append_pair("code_challenge", code_challenge);
        Ok(url)
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> AppResult<Session> {
        if code_verifier.is_empty() {
            return Err(AppError::IdentityProvider("code verifier missing".to_string()));
        }
        self.codes
            .get(code)
            .map(|token| Session {
                access_token: token.clone(),
                refresh_token: None,
            })
            .ok_or_else(|| AppError::IdentityProvider("invalid flow state".to_string()))
    }

    async fn refresh_session(&self, refresh_token: &str) -> AppResult<Session> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens
            .get(refresh_token)
            .map(|token| Session {
                access_token: token.clone(),
                refresh_token: Some(format!("{refresh_token}-next")),
            })
            .ok_or_else(|| AppError::IdentityProvider("Invalid Refresh Token".to_string()))
    }

    async fn get_current_user(&self, session: &Session) -> AppResult<Option<AuthenticatedUser>> {
        Ok(self.users.get(&session.access_token).cloned())
    }

    async fn sign_out(&self, _session: &Session) -> AppResult<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
