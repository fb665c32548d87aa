// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! drive-fetch API Server
//!
//! Google sign-in plus file, video and folder downloads streamed back to the
//! caller.

use drive_fetch::{
    config::Config,
    db::{connect_user_store, MemorySessionStore},
    services::GoogleOAuthClient,
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Missing OAuth credentials or session secret stop startup here.
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting drive-fetch API");

    let users = connect_user_store(&config.database_url).await?;

    let sessions = Arc::new(MemorySessionStore::new(
        config.session_ttl,
        config.login_state_ttl,
    ));
    spawn_session_purger(sessions.clone());

    let identity_provider = Arc::new(GoogleOAuthClient::new(&config)?);

    tracing::info!(
        yt_dlp = %config.yt_dlp_path.display(),
        require_login = config.require_login_for_downloads,
        "Download service initialized"
    );

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        users,
        sessions,
        identity_provider,
    )?);

    // Build router
    let app = drive_fetch::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Periodically drop idle sessions so the map does not grow without bound.
fn spawn_session_purger(sessions: Arc<MemorySessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sessions.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, remaining = sessions.len(), "Purged expired sessions");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("drive_fetch=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
