//! ideavote server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ideavote_common::Config;
use ideavote_core::{AccessGate, DomainPolicy, GoTrueClient, IdeaService, VoteService};
use ideavote_db::repositories::{IdeaRepository, VoteRepository};
use ideavote_web::AppState;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ideavote=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting ideavote server...");

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    let site_url = config.site_url().context("Invalid server.url")?;

    // Connect to database
    let db = ideavote_db::init(&config)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    ideavote_db::migrate(&db)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");

    // Identity provider and access gate
    let identity = GoTrueClient::new(
        &config.auth.identity_url,
        &config.auth.identity_anon_key,
        Duration::from_secs(config.auth.request_timeout_secs),
    )?;
    let policy = DomainPolicy::new(config.auth.allowed_domain.as_deref());
    match policy.domain() {
        Some(domain) => info!(domain, "Sign-in restricted to email domain"),
        None => tracing::warn!("No allowed email domain configured; any email may sign in"),
    }
    let access_gate = AccessGate::new(
        Arc::new(identity),
        policy,
        &site_url,
        &config.auth.oauth_provider,
    )?;

    // Initialize repositories and services
    let db = Arc::new(db);
    let idea_service = IdeaService::new(IdeaRepository::new(Arc::clone(&db)));
    let vote_service = VoteService::new(VoteRepository::new(Arc::clone(&db)));

    info!(quarter = %config.voting.current_quarter, "Voting quarter");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;

    let state = AppState {
        idea_service,
        vote_service,
        access_gate,
        config: Arc::new(config),
    };
    let app = ideavote_web::app(state);

    // Start server with graceful shutdown
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
