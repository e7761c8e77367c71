use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::VerificationError;

// ============ Tenant Input ============

/// Applicant data collected by a front end (popup form, injected widget or
/// prefilled page scan).
///
/// Every field is optional; providers only run when the field they key off
/// is present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRecord {
    /// Applicant's full name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// 12-digit national identity number (formatting characters allowed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_number: Option<String>,
    /// 10-character alphanumeric tax ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    /// 10-digit phone number (formatting characters allowed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Current residential address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_address: Option<String>,
    /// Current employer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer: Option<String>,
    /// Declared monthly salary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_salary: Option<f64>,
}

impl TenantRecord {
    /// Returns the trimmed value of an optional field, treating blank strings as absent.
    pub fn present(value: &Option<String>) -> Option<&str> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// True when at least one field a provider can key off is present.
    pub fn has_identifying_field(&self) -> bool {
        [
            &self.full_name,
            &self.identity_number,
            &self.tax_id,
            &self.phone_number,
            &self.email,
        ]
        .into_iter()
        .any(|field| Self::present(field).is_some())
    }
}

// ============ Providers ============

/// The six external verification sources.
///
/// Ordering follows the canonical listing used in recommendations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// National identity-document registry.
    Identity,
    /// Tax-ID registry.
    Tax,
    /// Telecom subscriber registry.
    Telecom,
    /// Email validation service.
    Email,
    /// Background / criminal-record service.
    Background,
    /// Rental-history service.
    Rental,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Identity,
        ProviderKind::Tax,
        ProviderKind::Telecom,
        ProviderKind::Email,
        ProviderKind::Background,
        ProviderKind::Rental,
    ];

    /// Stable snake_case identifier, as used in JSON keys and URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Identity => "identity",
            ProviderKind::Tax => "tax",
            ProviderKind::Telecom => "telecom",
            ProviderKind::Email => "email",
            ProviderKind::Background => "background",
            ProviderKind::Rental => "rental",
        }
    }

    /// Human-readable provider name reported in `ProviderResult::source`.
    pub fn source_name(self) -> &'static str {
        match self {
            ProviderKind::Identity => "UIDAI",
            ProviderKind::Tax => "Income Tax Department",
            ProviderKind::Telecom => "Telecom Database",
            ProviderKind::Email => "Email Verification Service",
            ProviderKind::Background => "Background Check Service",
            ProviderKind::Rental => "Rental History Database",
        }
    }

    /// Label used when listing unconfigured services in recommendations.
    pub fn service_label(self) -> &'static str {
        match self {
            ProviderKind::Identity => "Aadhaar verification",
            ProviderKind::Tax => "PAN verification",
            ProviderKind::Telecom => "Phone verification",
            ProviderKind::Email => "Email verification",
            ProviderKind::Background => "Background check",
            ProviderKind::Rental => "Rental history",
        }
    }

    /// Confidence reported by a verified result from this provider.
    pub fn confidence_ceiling(self) -> u8 {
        match self {
            ProviderKind::Identity => 95,
            ProviderKind::Tax => 90,
            ProviderKind::Telecom => 85,
            ProviderKind::Background => 80,
            ProviderKind::Rental => 75,
            ProviderKind::Email => 70,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown provider: {}", s))
    }
}

/// Outcome class of one provider invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Success,
    Error,
    NotConfigured,
}

// ============ Provider Payloads ============

/// Identity registry payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDetails {
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub photo_url: Option<String>,
}

/// Tax registry payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDetails {
    pub name: Option<String>,
    /// Registry status as reported upstream ("active", "inactive", ...).
    pub registry_status: String,
    pub category: Option<String>,
}

/// Telecom registry payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelecomDetails {
    pub carrier: Option<String>,
    pub location: Option<String>,
    /// Prepaid / postpaid.
    pub line_type: Option<String>,
}

/// Email validator payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDetails {
    pub domain: Option<String>,
    pub disposable: bool,
}

/// Background check payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundDetails {
    pub criminal_record: bool,
    pub court_cases: u32,
    pub pending_cases: u32,
    pub credit_score: Option<u32>,
    pub employment_status: Option<String>,
}

/// Rental history payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalDetails {
    pub total_rentals: u32,
    pub current_rentals: u32,
    pub past_rentals: u32,
    /// Issues reported upstream, kept opaque.
    pub issues: Vec<serde_json::Value>,
    pub evictions: u32,
    pub late_payments: u32,
    pub average_rating: Option<f64>,
    pub last_rental: Option<serde_json::Value>,
}

/// Provider-specific fields of a `ProviderResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderDetails {
    Identity(IdentityDetails),
    Tax(TaxDetails),
    Telecom(TelecomDetails),
    Email(EmailDetails),
    Background(BackgroundDetails),
    Rental(RentalDetails),
}

// ============ Provider Results ============

/// Uniform outcome of one provider invocation.
///
/// Every failure mode is data: a `ProviderResult` with `status` set to
/// `Error` or `NotConfigured` and `verified == false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResult {
    /// Which provider produced this result.
    pub kind: ProviderKind,
    /// Whether the provider positively verified the applicant.
    pub verified: bool,
    /// 0-100, the provider's ceiling when verified, else 0.
    pub confidence: u8,
    /// Human-readable provider name.
    pub source: String,
    /// When the provider was consulted.
    pub last_verified: DateTime<Utc>,
    /// Outcome class.
    pub status: ProviderStatus,
    /// Failure description for `Error` and `NotConfigured` results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Provider-specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ProviderDetails>,
}

impl ProviderResult {
    /// Builds a successful result from a well-formed provider response.
    pub fn success(kind: ProviderKind, verified: bool, details: ProviderDetails) -> Self {
        Self {
            kind,
            verified,
            confidence: if verified { kind.confidence_ceiling() } else { 0 },
            source: kind.source_name().to_string(),
            last_verified: Utc::now(),
            status: ProviderStatus::Success,
            error: None,
            details: Some(details),
        }
    }

    /// Captures a provider-level failure as data.
    ///
    /// Background and rental failures still carry their neutral payload
    /// (no criminal record, no rentals) so downstream consumers can read
    /// those fields unconditionally.
    pub fn failure(kind: ProviderKind, error: &VerificationError) -> Self {
        let details = match kind {
            ProviderKind::Background => {
                Some(ProviderDetails::Background(BackgroundDetails::default()))
            }
            ProviderKind::Rental => Some(ProviderDetails::Rental(RentalDetails::default())),
            _ => None,
        };

        Self {
            kind,
            verified: false,
            confidence: 0,
            source: kind.source_name().to_string(),
            last_verified: Utc::now(),
            status: error.status(),
            error: Some(error.to_string()),
            details,
        }
    }

    pub fn is_not_configured(&self) -> bool {
        self.status == ProviderStatus::NotConfigured
    }

    /// Criminal record flag of a background result; false for anything else.
    pub fn criminal_record(&self) -> bool {
        matches!(
            &self.details,
            Some(ProviderDetails::Background(b)) if b.criminal_record
        )
    }

    /// Eviction count of a rental result; 0 for anything else.
    pub fn evictions(&self) -> u32 {
        match &self.details {
            Some(ProviderDetails::Rental(r)) => r.evictions,
            _ => 0,
        }
    }

    /// Late payment count of a rental result; 0 for anything else.
    pub fn late_payments(&self) -> u32 {
        match &self.details {
            Some(ProviderDetails::Rental(r)) => r.late_payments,
            _ => 0,
        }
    }
}

// ============ Verification Report ============

/// Discrete risk tier derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
    /// Only produced when the orchestration itself failed.
    Unknown,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very High",
            RiskLevel::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// How much of the provider set actually contributed to a report.
///
/// Separates "nothing configured" from "configured but nothing passed",
/// which both yield an overall score of 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    /// Providers invoked for this record.
    pub invoked: usize,
    /// Invoked providers that had a usable credential.
    pub configured: usize,
    /// Invoked providers without a usable credential.
    pub not_configured: usize,
    /// Configured providers whose result counts as a pass in scoring.
    pub verified: usize,
}

/// Aggregate output of one verification run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// Unique report identifier, for history keys on the front end.
    pub id: Uuid,
    /// When the run started.
    pub timestamp: DateTime<Utc>,
    /// The record that was verified.
    pub tenant_data: TenantRecord,
    /// Results of invoked providers only.
    pub verifications: BTreeMap<ProviderKind, ProviderResult>,
    /// Weighted score, 0-100.
    pub overall_score: u8,
    /// Tier derived from `overall_score`.
    pub risk_level: RiskLevel,
    /// Ordered, rule-based advice.
    pub recommendations: Vec<String>,
    /// Provider coverage summary.
    pub coverage: Coverage,
    /// Set only when the orchestration itself failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
