//! Reduces per-provider results into a score, a risk tier and advice.
//!
//! Everything here is a pure function of the assembled result map, so the
//! outcome does not depend on the order in which providers finished.

use std::collections::BTreeMap;

use crate::models::{Coverage, ProviderKind, ProviderResult, RiskLevel};

pub const SETUP_REQUIRED: &str = "SETUP REQUIRED: No API keys configured. Please set up your environment variables to enable verification services.";
pub const SETUP_INSTRUCTIONS: &str = "See ENVIRONMENT_SETUP.md for detailed instructions.";
pub const CONFIGURE_FOR_COVERAGE: &str =
    "Configure these services for complete verification coverage.";
pub const RECOMMENDED: &str =
    "RECOMMENDED: This tenant appears to be a good candidate for rental.";
pub const CAUTION_ADDITIONAL: &str =
    "CAUTION: Additional verification may be required before proceeding.";
pub const NOT_RECOMMENDED: &str = "NOT RECOMMENDED: This tenant has significant risk factors.";
pub const CRIMINAL_RECORD: &str =
    "CRITICAL: Criminal record found. Strongly advise against proceeding.";
pub const EVICTIONS: &str = "WARNING: Previous evictions detected. Proceed with extreme caution.";
pub const LATE_PAYMENTS: &str = "CAUTION: Multiple late payments in rental history.";
pub const NO_VERIFICATION_DATA: &str =
    "NO VERIFICATION DATA: Unable to verify tenant information with current configuration.";
pub const INTERNAL_ERROR: &str =
    "ERROR: Verification could not be completed due to an internal error. Please try again.";

/// Results keyed by provider, as assembled by the orchestrator.
pub type Verifications = BTreeMap<ProviderKind, ProviderResult>;

/// Weight a provider carries in the overall score. Rental history only feeds recommendations.
pub fn weight(kind: ProviderKind) -> u32 {
    match kind {
        ProviderKind::Identity => 30,
        ProviderKind::Tax => 25,
        ProviderKind::Telecom => 20,
        ProviderKind::Email => 10,
        ProviderKind::Background => 15,
        ProviderKind::Rental => 0,
    }
}

/// Whether a configured result counts as a pass.
///
/// The background check passes on a clean record rather than on `verified`.
/// A background call that errored (transport fault, rate limit) carries the
/// neutral payload, so it reads as clean and still scores its weight.
fn passes(result: &ProviderResult) -> bool {
    match result.kind {
        ProviderKind::Background => !result.criminal_record(),
        _ => result.verified,
    }
}

fn configured(verifications: &Verifications) -> impl Iterator<Item = &ProviderResult> {
    verifications.values().filter(|r| !r.is_not_configured())
}

/// Weighted share of configured, scoring providers that passed, as 0-100.
pub fn calculate_overall_score(verifications: &Verifications) -> u8 {
    let mut total_score = 0u32;
    let mut total_weight = 0u32;
    let mut configured_services = 0usize;

    for result in configured(verifications) {
        let w = weight(result.kind);
        if w == 0 {
            continue;
        }
        configured_services += 1;
        total_weight += w;
        if passes(result) {
            total_score += w;
        }
    }

    if configured_services == 0 || total_weight == 0 {
        return 0;
    }

    let score = (100.0 * f64::from(total_score) / f64::from(total_weight)).round();
    score.clamp(0.0, 100.0) as u8
}

/// Maps a score onto its risk tier; each bound is inclusive.
pub fn calculate_risk_level(score: u8) -> RiskLevel {
    match score {
        90.. => RiskLevel::Low,
        70..=89 => RiskLevel::Medium,
        50..=69 => RiskLevel::High,
        _ => RiskLevel::VeryHigh,
    }
}

/// Counts how many providers ran, had credentials, and passed.
pub fn calculate_coverage(verifications: &Verifications) -> Coverage {
    let not_configured = verifications
        .values()
        .filter(|r| r.is_not_configured())
        .count();

    Coverage {
        invoked: verifications.len(),
        configured: verifications.len() - not_configured,
        not_configured,
        verified: configured(verifications)
            .filter(|r| weight(r.kind) > 0 && passes(r))
            .count(),
    }
}

/// Ordered, rule-based advice for a scored result set.
pub fn generate_recommendations(verifications: &Verifications, overall_score: u8) -> Vec<String> {
    let mut recommendations = Vec::new();

    let not_configured: Vec<&str> = verifications
        .values()
        .filter(|r| r.is_not_configured())
        .map(|r| r.kind.service_label())
        .collect();

    if not_configured.len() == ProviderKind::ALL.len() {
        recommendations.push(SETUP_REQUIRED.to_string());
        recommendations.push(SETUP_INSTRUCTIONS.to_string());
        return recommendations;
    }

    if !not_configured.is_empty() {
        recommendations.push(format!(
            "PARTIAL SETUP: The following services are not configured: {}",
            not_configured.join(", ")
        ));
        recommendations.push(CONFIGURE_FOR_COVERAGE.to_string());
    }

    if overall_score > 0 {
        let headline = match overall_score {
            90.. => RECOMMENDED,
            70..=89 => CAUTION_ADDITIONAL,
            _ => NOT_RECOMMENDED,
        };
        recommendations.push(headline.to_string());

        let ran = |kind: ProviderKind| {
            verifications
                .get(&kind)
                .filter(|r| !r.is_not_configured())
        };

        if ran(ProviderKind::Background).is_some_and(|r| r.criminal_record()) {
            recommendations.push(CRIMINAL_RECORD.to_string());
        }
        if let Some(rental) = ran(ProviderKind::Rental) {
            if rental.evictions() > 0 {
                recommendations.push(EVICTIONS.to_string());
            }
            if rental.late_payments() > 3 {
                recommendations.push(LATE_PAYMENTS.to_string());
            }
        }
    } else if not_configured.is_empty() {
        recommendations.push(NO_VERIFICATION_DATA.to_string());
    }

    recommendations
}
