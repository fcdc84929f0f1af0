//! Supabase Auth (GoTrue) client.

use std::time::Duration;

use async_trait::async_trait;
use ideavote_common::{AppError, AppResult};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::identity::{AuthenticatedUser, IdentityProvider, Session};

/// [`IdentityProvider`] backed by the Supabase Auth REST API.
#[derive(Clone)]
pub struct GoTrueClient {
    http_client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl GoTrueClient {
    /// Create a client for the project at `base_url`.
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("ideavote/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        Url::parse(&format!("{}/auth/v1/{path}", self.base_url))
            .map_err(|e| AppError::Config(format!("Invalid identity provider URL: {e}")))
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> AppResult<Response> {
        request
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("{what} request failed: {e}")))
    }
}

/// Pull the human readable message out of an auth error body.
fn error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        msg: Option<String>,
        message: Option<String>,
        error_description: Option<String>,
        error: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.msg.or(b.error_description).or(b.message).or(b.error))
        .unwrap_or_else(|| format!("identity provider returned {status}"))
}

async fn into_error(response: Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AppError::IdentityProvider(error_message(status, &body))
}

async fn parse_session(response: Response) -> AppResult<Session> {
    let token: TokenResponse = response.json().await.map_err(|e| {
        AppError::IdentityProvider(format!("Failed to parse token response: {e}"))
    })?;

    Ok(Session {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
    })
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn request_one_time_link(
        &self,
        email: &str,
        redirect_url: &Url,
        code_challenge: &str,
    ) -> AppResult<()> {
        let mut url = self.endpoint("otp")?;
        url.query_pairs_mut()
            .append_pair("redirect_to", redirect_url.as_str());

        let request = self.http_client.post(url).json(&json!({
            "email": email,
            "create_user": true,
            "code_challenge": code_challenge,
            "code_challenge_method": "s256",
        }));
        let response = self.send(request, "OTP").await?;

        if !response.status().is_success() {
            return Err(into_error(response).await);
        }
        Ok(())
    }

    async fn oauth_redirect(
        &self,
        provider: &str,
        redirect_url: &Url,
        code_challenge: &str,
    ) -> AppResult<Url> {
        let mut url = self.endpoint("authorize")?;
        url.query_pairs_mut()
            .append_pair("provider", provider)
            .append_pair("redirect_to", redirect_url.as_str())
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "s256");
        Ok(url)
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> AppResult<Session> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "pkce");

        let request = self.http_client.post(url).json(&json!({
            "auth_code": code,
            "code_verifier": code_verifier,
        }));
        let response = self.send(request, "Token").await?;

        if !response.status().is_success() {
            return Err(into_error(response).await);
        }

        parse_session(response).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> AppResult<Session> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");

        let request = self.http_client.post(url).json(&json!({
            "refresh_token": refresh_token,
        }));
        let response = self.send(request, "Refresh").await?;

        if !response.status().is_success() {
            return Err(into_error(response).await);
        }
        parse_session(response).await
    }

    async fn get_current_user(&self, session: &Session) -> AppResult<Option<AuthenticatedUser>> {
        let request = self
            .http_client
            .get(self.endpoint("user")?)
            .bearer_auth(&session.access_token);
        let response = self.send(request, "User").await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Ok(None),
            status if !status.is_success() => return Err(into_error(response).await),
            _ => {}
        }

        let user: UserResponse = response.json().await.map_err(|e| {
            AppError::IdentityProvider(format!("Failed to parse user response: {e}"))
        })?;

        Ok(Some(AuthenticatedUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }))
    }

    async fn sign_out(&self, session: &Session) -> AppResult<()> {
        let request = self
            .http_client
            .post(self.endpoint("logout")?)
            .bearer_auth(&session.access_token);
        let response = self.send(request, "Logout").await?;

        match response.status() {
            // Already invalid sessions count as signed out.
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            _ => Err(into_error(response).await),
        }
    }
}
