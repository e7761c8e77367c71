use chrono::Utc;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::VerificationError;
use crate::models::*;
use crate::rate_limiter::RateLimiter;
use crate::scoring;
use crate::services::{build_providers, VerificationProvider};

/// Whether a provider has something to key off in this record.
///
/// Background and rental checks use several fields jointly, so they run as
/// soon as any identifying field is present.
pub fn is_eligible(kind: ProviderKind, record: &TenantRecord) -> bool {
    match kind {
        ProviderKind::Identity => TenantRecord::present(&record.identity_number).is_some(),
        ProviderKind::Tax => TenantRecord::present(&record.tax_id).is_some(),
        ProviderKind::Telecom => TenantRecord::present(&record.phone_number).is_some(),
        ProviderKind::Email => TenantRecord::present(&record.email).is_some(),
        ProviderKind::Background | ProviderKind::Rental => record.has_identifying_field(),
    }
}

/// Fans a tenant record out to every eligible provider and scores the results.
#[derive(Clone)]
pub struct VerificationOrchestrator {
    providers: Vec<Arc<dyn VerificationProvider>>,
}

impl VerificationOrchestrator {
    pub fn new(providers: Vec<Arc<dyn VerificationProvider>>) -> Self {
        Self { providers }
    }

    /// Wires the six HTTP-backed providers from configuration.
    pub fn from_config(
        config: &Config,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, VerificationError> {
        Ok(Self::new(build_providers(config, limiter)?))
    }

    pub fn provider_kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    /// Runs one verification.
    ///
    /// Provider failures are folded into their results. The only degraded
    /// path is a provider task that panicked, which yields a report with
    /// score 0 and an `Unknown` risk level.
    pub async fn run_verification(&self, record: TenantRecord) -> VerificationReport {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("verification", report_id = %id);

        self.run(id, record).instrument(span).await
    }

    async fn run(&self, id: Uuid, record: TenantRecord) -> VerificationReport {
        let timestamp = Utc::now();
        let record = Arc::new(record);

        let selected: Vec<Arc<dyn VerificationProvider>> = self
            .providers
            .iter()
            .filter(|p| is_eligible(p.kind(), &record))
            .cloned()
            .collect();

        if selected.is_empty() {
            tracing::info!("No identifying fields present; no providers invoked");
        } else {
            tracing::info!("Starting verification with {} providers", selected.len());
        }

        let tasks: Vec<_> = selected
            .into_iter()
            .map(|provider| {
                let record = Arc::clone(&record);
                tokio::spawn(
                    async move { provider.verify(&record).await }.in_current_span(),
                )
            })
            .collect();

        let mut verifications = BTreeMap::new();
        let mut fault = None;

        for outcome in join_all(tasks).await {
            match outcome {
                Ok(result) => {
                    verifications.insert(result.kind, result);
                }
                Err(join_err) => {
                    tracing::error!("Provider task failed: {}", join_err);
                    if fault.is_none() {
                        fault = Some(VerificationError::Internal(join_err.to_string()));
                    }
                }
            }
        }

        let tenant_data = Arc::unwrap_or_clone(record);
        let coverage = scoring::calculate_coverage(&verifications);

        if let Some(error) = fault {
            return VerificationReport {
                id,
                timestamp,
                tenant_data,
                verifications,
                overall_score: 0,
                risk_level: RiskLevel::Unknown,
                recommendations: vec![scoring::INTERNAL_ERROR.to_string()],
                coverage,
                error: Some(error.to_string()),
            };
        }

        let overall_score = scoring::calculate_overall_score(&verifications);
        let risk_level = scoring::calculate_risk_level(overall_score);
        let recommendations = scoring::generate_recommendations(&verifications, overall_score);

        tracing::info!(
            "Verification complete: score={} risk={} configured={}/{}",
            overall_score,
            risk_level,
            coverage.configured,
            coverage.invoked
        );

        VerificationReport {
            id,
            timestamp,
            tenant_data,
            verifications,
            overall_score,
            risk_level,
            recommendations,
            coverage,
            error: None,
        }
    }
}
