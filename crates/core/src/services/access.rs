//! Access gate: domain-restricted sign-in and per-request session checks.
//!
//! A request moves from unauthenticated, to waiting on the emailed link (or
//! OAuth round trip), to authenticated. The allowed email domain is checked
//! before the provider is contacted, again on the callback, and again on every
//! privileged request; nothing about a user's access is cached.

use std::sync::Arc;

use ideavote_common::{AppError, AppResult};
use url::Url;

use super::identity::{AuthenticatedUser, IdentityProvider, Pkce, Session};

/// Policy restricting sign-in to one email domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainPolicy {
    suffix: Option<String>,
}

impl DomainPolicy {
    /// Allow only emails ending in `@<domain>`; `None` or blank allows everyone.
    ///
    /// The domain is trimmed, lowercased and stripped of a leading `@`.
    #[must_use]
    pub fn new(domain: Option<&str>) -> Self {
        let suffix = domain
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty())
            .map(|d| format!("@{d}"));
        Self { suffix }
    }

    /// The allowed domain, if sign-in is restricted.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.suffix.as_deref().and_then(|s| s.strip_prefix('@'))
    }

    /// Whether the email may sign in. Case-insensitive exact suffix match.
    #[must_use]
    pub fn permits(&self, email: &str) -> bool {
        match &self.suffix {
            Some(suffix) => email.trim().to_lowercase().ends_with(suffix.as_str()),
            None => true,
        }
    }
}

/// Result of a sign-in link request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// The link was sent; the verifier must come back with the callback.
    Sent {
        /// PKCE verifier to keep until the callback.
        code_verifier: String,
    },
    /// The email is outside the allowed domain. The provider was not contacted.
    Denied,
    /// The provider refused the request.
    Failed(String),
}

/// Result of the sign-in callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The verified user is allowed in.
    Authenticated {
        /// Tokens to store in the browser.
        session: Session,
        /// The verified user.
        user: AuthenticatedUser,
    },
    /// The verified email is outside the allowed domain; the session was revoked.
    Denied,
    /// The code could not be exchanged or verified.
    Failed(String),
}

/// Start of an OAuth sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthStart {
    /// Provider page the browser is sent to.
    pub authorize_url: Url,
    /// PKCE verifier to keep until the callback.
    pub code_verifier: String,
}

/// An allowed user behind the request's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    /// The verified, domain-permitted user.
    pub user: AuthenticatedUser,
    /// New tokens when the presented access token had expired and was renewed.
    pub refreshed: Option<Session>,
}

/// Access gate over an identity provider.
#[derive(Clone)]
pub struct AccessGate {
    provider: Arc<dyn IdentityProvider>,
    policy: DomainPolicy,
    callback_url: Url,
    oauth_provider: String,
}

impl AccessGate {
    /// Create a gate whose sign-in links return to `<site_url>/auth/callback`.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        policy: DomainPolicy,
        site_url: &Url,
        oauth_provider: &str,
    ) -> AppResult<Self> {
        let callback_url = site_url
            .join("/auth/callback")
            .map_err(|e| AppError::Config(format!("Invalid site URL: {e}")))?;

        Ok(Self {
            provider,
            policy,
            callback_url,
            oauth_provider: oauth_provider.to_string(),
        })
    }

    /// The domain policy in force.
    #[must_use]
    pub const fn policy(&self) -> &DomainPolicy {
        &self.policy
    }

    /// Request a one-time sign-in link for `email`.
    pub async fn request_sign_in(&self, email: &str) -> SignInOutcome {
        let email = email.trim();

        if !self.policy.permits(email) {
            tracing::info!(email, "Sign-in denied by domain policy");
            return SignInOutcome::Denied;
        }
        if email.is_empty() {
            return SignInOutcome::Failed("Email is required".to_string());
        }

        let pkce = Pkce::generate();
        match self
            .provider
            .request_one_time_link(email, &self.callback_url, &pkce.challenge)
            .await
        {
            Ok(()) => {
                tracing::info!(email, "Sign-in link requested");
                SignInOutcome::Sent {
                    code_verifier: pkce.verifier,
                }
            }
            Err(e) => {
                tracing::warn!(email, error = %e, "Sign-in link request failed");
                SignInOutcome::Failed(e.user_message())
            }
        }
    }

    /// Begin an OAuth sign-in, with the configured provider unless one is given.
    pub async fn begin_oauth(&self, provider: Option<&str>) -> AppResult<OAuthStart> {
        let provider = provider
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(self.oauth_provider.as_str());

        let pkce = Pkce::generate();
        let authorize_url = self
            .provider
            .oauth_redirect(provider, &self.callback_url, &pkce.challenge)
            .await?;

        Ok(OAuthStart {
            authorize_url,
            code_verifier: pkce.verifier,
        })
    }

    /// Finish sign-in from the callback `code`.
    ///
    /// The domain policy is applied again to the verified email, and a session
    /// that fails it is signed out immediately.
    pub async fn complete_sign_in(&self, code: &str, code_verifier: &str) -> CallbackOutcome {
        let session = match self
            .provider
            .exchange_code_for_session(code, code_verifier)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Code exchange failed");
                return CallbackOutcome::Failed(e.user_message());
            }
        };

        let user = match self.provider.get_current_user(&session).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                return CallbackOutcome::Failed("Sign-in could not be verified".to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fetching signed-in user failed");
                return CallbackOutcome::Failed(e.user_message());
            }
        };

        if !self.policy.permits(&user.email) {
            tracing::info!(user_id = %user.id, email = %user.email, "Verified email denied by domain policy");
            if let Err(e) = self.provider.sign_out(&session).await {
                tracing::warn!(user_id = %user.id, error = %e, "Sign-out of denied session failed");
            }
            return CallbackOutcome::Denied;
        }

        tracing::info!(user_id = %user.id, "User signed in");
        CallbackOutcome::Authenticated { session, user }
    }

    /// The allowed user behind `session`, re-derived on every call.
    ///
    /// An expired access token is renewed with the refresh token when one is
    /// present; the domain policy is applied to whichever session answers.
    pub async fn current_user(&self, session: &Session) -> AppResult<Option<ActiveSession>> {
        if let Some(user) = self.provider.get_current_user(session).await? {
            return Ok(self.permitted(user).map(|user| ActiveSession {
                user,
                refreshed: None,
            }));
        }

        let Some(refresh_token) = session.refresh_token.as_deref().filter(|t| !t.is_empty())
        else {
            return Ok(None);
        };
        let refreshed = match self.provider.refresh_session(refresh_token).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                tracing::info!(error = %e, "Session refresh rejected");
                return Ok(None);
            }
        };

        let Some(user) = self.provider.get_current_user(&refreshed).await? else {
            return Ok(None);
        };
        tracing::debug!(user_id = %user.id, "Session refreshed");
        Ok(self.permitted(user).map(|user| ActiveSession {
            user,
            refreshed: Some(refreshed),
        }))
    }

    fn permitted(&self, user: AuthenticatedUser) -> Option<AuthenticatedUser> {
        if self.policy.permits(&user.email) {
            Some(user)
        } else {
            tracing::info!(user_id = %user.id, "Session denied by domain policy");
            None
        }
    }

    /// Sign the session out at the provider.
    pub async fn sign_out(&self, session: &Session) -> AppResult<()> {
        self.provider.sign_out(session).await
    }
}
