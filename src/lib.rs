//! Tenant Verification Library
//!
//! Checks a prospective tenant against six external registries (identity,
//! tax, telecom, email, background and rental history) in parallel and folds
//! the outcomes into a weighted score, a risk tier and recommendations.
//!
//! # Modules
//!
//! - `config`: Environment-driven provider configuration.
//! - `errors`: Error handling types.
//! - `fake_provider`: Deterministic provider for tests (`test-util` feature).
//! - `handlers`: HTTP request handlers and router.
//! - `http_client`: Shared outbound HTTP client.
//! - `models`: Tenant records, provider results and reports.
//! - `orchestrator`: Parallel fan-out and report assembly.
//! - `rate_limiter`: Per-provider fixed-window rate limiting.
//! - `scoring`: Score, risk tier and recommendation rules.
//! - `services`: Provider clients.
//! - `validation`: Input normalisation.

pub mod config;
pub mod errors;
#[cfg(any(test, feature = "test-util"))]
pub mod fake_provider;
pub mod handlers;
pub mod http_client;
pub mod models;
pub mod orchestrator;
pub mod rate_limiter;
pub mod scoring;
pub mod services;
pub mod validation;
