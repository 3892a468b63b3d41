use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use churn_scoring_api::app::{build_app, RateLimit};
use churn_scoring_api::artifact::ScoringArtifact;
use churn_scoring_api::config::Config;
use churn_scoring_api::handlers::AppState;
use churn_scoring_api::scoring::ChurnScorer;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - The scoring artifact (fatal if missing or invalid).
/// - HTTP routes and middleware (CORS, body limit, rate limiting).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "churn_scoring_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // The service never starts without a valid artifact
    let artifact = ScoringArtifact::load(&config.model_path, config.model_checksum.as_deref())
        .with_context(|| {
            format!(
                "failed to load scoring artifact from {}",
                config.model_path.display()
            )
        })?;
    tracing::info!(
        "✓ Scoring artifact ready: {} features, currency {}",
        artifact.feature_columns().len(),
        artifact.metadata().currency
    );

    let scorer = ChurnScorer::new(Arc::new(artifact))
        .with_relabeled_importance(config.relabel_feature_importance);

    let rate_limit = RateLimit {
        per_second: config.rate_limit_per_second,
        burst: config.rate_limit_burst,
    };
    let addr = format!("{}:{}", config.host, config.port);

    let app_state = Arc::new(AppState::new(config, scorer));
    let app = build_app(app_state, Some(rate_limit))?;

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
