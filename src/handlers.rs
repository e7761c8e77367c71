use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{ProviderKind, TenantRecord, VerificationReport};
use crate::orchestrator::VerificationOrchestrator;
use crate::rate_limiter::{RateLimitState, RateLimiter};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Per-provider request budgets, shared with the provider clients.
    pub limiter: Arc<RateLimiter>,
    /// Runs verifications against the provider set.
    pub orchestrator: VerificationOrchestrator,
}

/// Configuration status of one provider. Never carries the credential.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatusView {
    pub kind: ProviderKind,
    pub source: &'static str,
    pub configured: bool,
    pub base_url: String,
    pub rate_limit: u32,
    pub window: Option<RateLimitState>,
}

fn status_view(state: &AppState, kind: ProviderKind) -> ProviderStatusView {
    let provider = state.config.provider(kind);
    ProviderStatusView {
        kind,
        source: kind.source_name(),
        configured: state.config.is_configured(kind),
        base_url: provider.base_url.clone(),
        rate_limit: provider.rate_limit,
        window: state.limiter.snapshot(kind),
    }
}

/// Health check endpoint.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "tenant-verify",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/verify
///
/// Verifies a tenant record against every eligible provider.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `payload` - The tenant record, or the reason it could not be parsed.
///
/// # Returns
///
/// * `Result<Json<VerificationReport>, AppError>` - The report, or 400 for an unreadable body.
pub async fn verify_tenant(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TenantRecord>, JsonRejection>,
) -> Result<Json<VerificationReport>, AppError> {
    let Json(record) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    tracing::info!("POST /verify");
    let report = state.orchestrator.run_verification(record).await;

    Ok(Json(report))
}

/// GET /api/v1/providers
///
/// Lists every provider with its configuration and current window usage.
pub async fn provider_status(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderStatusView>> {
    Json(
        ProviderKind::ALL
            .into_iter()
            .map(|kind| status_view(&state, kind))
            .collect(),
    )
}

/// GET /api/v1/providers/:kind
pub async fn provider_status_by_kind(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<ProviderStatusView>, AppError> {
    let kind: ProviderKind = kind.parse().map_err(AppError::NotFound)?;
    Ok(Json(status_view(&state, kind)))
}

/// Builds the application router with tracing, CORS and a body size limit.
///
/// Per-IP throttling is layered on by the binary, since it needs the peer address.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/verify", post(verify_tenant))
        .route("/api/v1/providers", get(provider_status))
        .route("/api/v1/providers/:kind", get(provider_status_by_kind))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                // Cors sits directly over the routes: it needs a `Default` response body.
                .layer(CorsLayer::permissive()),
        )
}
