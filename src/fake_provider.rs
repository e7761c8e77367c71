//! Deterministic stand-in for a verification provider.
//!
//! Returns a canned result for every call, optionally after a delay, and
//! counts invocations. Only compiled for tests and the `test-util` feature.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::VerificationError;
use crate::models::*;
use crate::services::VerificationProvider;

#[derive(Debug, Clone)]
enum Behaviour {
    Respond(ProviderResult),
    Panic,
}

#[derive(Debug, Clone)]
pub struct FakeProvider {
    kind: ProviderKind,
    behaviour: Behaviour,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

fn default_details(kind: ProviderKind) -> ProviderDetails {
    match kind {
        ProviderKind::Identity => ProviderDetails::Identity(IdentityDetails::default()),
        ProviderKind::Tax => ProviderDetails::Tax(TaxDetails {
            registry_status: "active".to_string(),
            ..Default::default()
        }),
        ProviderKind::Telecom => ProviderDetails::Telecom(TelecomDetails::default()),
        ProviderKind::Email => ProviderDetails::Email(EmailDetails::default()),
        ProviderKind::Background => ProviderDetails::Background(BackgroundDetails::default()),
        ProviderKind::Rental => ProviderDetails::Rental(RentalDetails::default()),
    }
}

impl FakeProvider {
    /// Always answers with `result`.
    pub fn with_result(result: ProviderResult) -> Self {
        Self {
            kind: result.kind,
            behaviour: Behaviour::Respond(result),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn verified(kind: ProviderKind) -> Self {
        Self::with_result(ProviderResult::success(kind, true, default_details(kind)))
    }

    pub fn unverified(kind: ProviderKind) -> Self {
        Self::with_result(ProviderResult::success(kind, false, default_details(kind)))
    }

    pub fn not_configured(kind: ProviderKind) -> Self {
        Self::with_result(ProviderResult::failure(
            kind,
            &VerificationError::NotConfigured(kind),
        ))
    }

    /// Answers with a transport error result.
    pub fn failing(kind: ProviderKind, message: &str) -> Self {
        Self::with_result(ProviderResult::failure(
            kind,
            &VerificationError::Transport(message.to_string()),
        ))
    }

    pub fn background(criminal_record: bool) -> Self {
        Self::with_result(ProviderResult::success(
            ProviderKind::Background,
            true,
            ProviderDetails::Background(BackgroundDetails {
                criminal_record,
                ..Default::default()
            }),
        ))
    }

    pub fn rental(evictions: u32, late_payments: u32) -> Self {
        Self::with_result(ProviderResult::success(
            ProviderKind::Rental,
            true,
            ProviderDetails::Rental(RentalDetails {
                evictions,
                late_payments,
                ..Default::default()
            }),
        ))
    }

    /// Panics inside `verify`, simulating a provider task crash.
    pub fn panicking(kind: ProviderKind) -> Self {
        Self {
            kind,
            behaviour: Behaviour::Panic,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `verify` calls so far, shared across clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<dyn VerificationProvider> {
        Arc::new(self)
    }
}

#[async_trait]
impl VerificationProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn verify(&self, _record: &TenantRecord) -> ProviderResult {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behaviour {
            Behaviour::Respond(result) => {
                let mut result = result.clone();
                result.last_verified = chrono::Utc::now();
                result
            }
            Behaviour::Panic => panic!("{} provider crashed", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_calls_across_clones() {
        let fake = FakeProvider::verified(ProviderKind::Identity);
        let clone = fake.clone();

        let result = clone.verify(&TenantRecord::default()).await;

        assert!(result.verified);
        assert_eq!(result.confidence, 95);
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn test_not_configured_fake_mirrors_real_result() {
        let result = FakeProvider::not_configured(ProviderKind::Email)
            .verify(&TenantRecord::default())
            .await;

        assert!(result.is_not_configured());
        assert!(!result.verified);
        assert_eq!(
            result.error.as_deref(),
            Some("Email Verification Service API key not configured. Please set up your environment variables.")
        );
    }
}
