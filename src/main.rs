use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tenant_verify::config::Config;
use tenant_verify::handlers::{self, AppState};
use tenant_verify::orchestrator::VerificationOrchestrator;
use tenant_verify::rate_limiter::RateLimiter;

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, wires the provider clients and
/// starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tenant_verify=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    config.log_status();

    let limiter = Arc::new(RateLimiter::from_config(&config));
    let orchestrator = VerificationOrchestrator::from_config(&config, Arc::clone(&limiter))?;
    tracing::info!(
        "Provider clients initialized: {:?}",
        orchestrator.provider_kinds()
    );

    let app_state = Arc::new(AppState {
        config: config.clone(),
        limiter,
        orchestrator,
    });

    // 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let app = handlers::router(app_state).layer(GovernorLayer {
        config: governor_conf,
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
