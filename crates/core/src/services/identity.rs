//! Identity provider abstraction.
//!
//! Sign-in is delegated to an external provider that sends one-time links,
//! runs OAuth, and owns sessions. The application keeps nothing but the
//! session tokens in cookies and asks the provider who they belong to.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ideavote_common::AppResult;
use rand::RngCore;
use sha2::{Digest, Sha256};
use url::Url;

/// Session tokens issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Short-lived bearer token sent with provider requests.
    pub access_token: String,
    /// Long-lived token that renews the session once the access token expires.
    pub refresh_token: Option<String>,
}

/// A verified user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Provider user id, used as the vote owner.
    pub id: String,
    /// Verified email address.
    pub email: String,
}

/// Operations the application needs from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Email a one-time sign-in link that returns to `redirect_url`.
    async fn request_one_time_link(
        &self,
        email: &str,
        redirect_url: &Url,
        code_challenge: &str,
    ) -> AppResult<()>;

    /// URL that starts an OAuth sign-in with `provider`.
    async fn oauth_redirect(
        &self,
        provider: &str,
        redirect_url: &Url,
        code_challenge: &str,
    ) -> AppResult<Url>;

    /// Trade the code from the callback for a session.
    async fn exchange_code_for_session(&self, code: &str, code_verifier: &str)
    -> AppResult<Session>;

    /// Trade a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> AppResult<Session>;

    /// The user behind a session, or `None` when the session is not valid.
    async fn get_current_user(&self, session: &Session) -> AppResult<Option<AuthenticatedUser>>;

    /// Invalidate a session.
    async fn sign_out(&self, session: &Session) -> AppResult<()>;
}

/// PKCE verifier/challenge pair (RFC 7636, S256).
#[derive(Debug, Clone)]
pub struct Pkce {
    /// Random secret kept by the application until the callback.
    pub verifier: String,
    /// `BASE64URL(SHA256(verifier))`, sent with the sign-in request.
    pub challenge: String,
}

impl Pkce {
    /// Generate a fresh random verifier and its challenge.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = Self::challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    /// S256 challenge for a verifier.
    #[must_use]
    pub fn challenge_for(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}
