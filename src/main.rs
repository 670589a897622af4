use std::sync::Arc;

use scoring_api::auth::Authenticator;
use scoring_api::clock::SystemClock;
use scoring_api::config::Config;
use scoring_api::dispatcher::MethodDispatcher;
use scoring_api::handlers::{self, AppState};
use scoring_api::obs;
use scoring_api::scoring::StoreScorer;

/// Main entry point for the application.
///
/// Loads configuration, installs logging, wires the dispatcher to the
/// default score store and serves `POST /method` until Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    obs::init_tracing(config.log_file.as_deref())?;
    tracing::info!("Configuration loaded successfully");
    tracing::debug!("Admin login: {}", config.auth.admin_login);

    let scorer = StoreScorer::new(config.score_cache_ttl, config.score_cache_capacity);
    tracing::info!(
        "Score store initialized ({}s TTL, {} capacity)",
        config.score_cache_ttl.as_secs(),
        config.score_cache_capacity
    );

    let dispatcher = MethodDispatcher::new(
        Authenticator::new(config.auth.clone()),
        Arc::new(scorer),
        Arc::new(SystemClock),
    );
    let app = handlers::router(Arc::new(AppState { dispatcher }));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting server at {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
