//! Application configuration.

use serde::Deserialize;
use std::path::Path;
use url::Url;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Voting period configuration.
    #[serde(default)]
    pub voting: VotingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Stable public URL of the site, used in sign-in email links.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Email domain allowed to sign in (e.g. `example.com`).
    ///
    /// When unset or blank every verified email is accepted.
    #[serde(default)]
    pub allowed_domain: Option<String>,
    /// Base URL of the identity provider (Supabase project URL).
    pub identity_url: String,
    /// Public API key sent with every identity provider request.
    pub identity_anon_key: String,
    /// OAuth provider used by the "sign in with ..." button.
    #[serde(default = "default_oauth_provider")]
    pub oauth_provider: String,
    /// Timeout for identity provider requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Voting period configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VotingConfig {
    /// Label of the quarter currently open for ideas and votes.
    #[serde(default = "default_current_quarter")]
    pub current_quarter: String,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            current_quarter: default_current_quarter(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_oauth_provider() -> String {
    "google".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    10
}

fn default_current_quarter() -> String {
    "2026Q1".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` in the working directory, if present
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `IDEAVOTE_ENV`)
    /// 4. Environment variables with `IDEAVOTE__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("IDEAVOTE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("IDEAVOTE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize::<Self>()?.validated()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("IDEAVOTE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize::<Self>()?.validated()
    }

    /// Parsed public site URL.
    pub fn site_url(&self) -> Result<Url, config::ConfigError> {
        Url::parse(&self.server.url)
            .map_err(|e| config::ConfigError::Message(format!("invalid server.url: {e}")))
    }

    fn validated(self) -> Result<Self, config::ConfigError> {
        self.site_url()?;
        Url::parse(&self.auth.identity_url)
            .map_err(|e| config::ConfigError::Message(format!("invalid auth.identity_url: {e}")))?;
        if self.voting.current_quarter.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "voting.current_quarter must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}
