use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::{usable_credential, Config};
use crate::errors::VerificationError;
use crate::http_client::{endpoint, ProviderHttpClient};
use crate::models::*;
use crate::rate_limiter::RateLimiter;
use crate::validation::{normalize_identity_number, normalize_phone, normalize_tax_id, validate_email};

/// Fixed `purpose` tag sent with every provider request.
pub const PURPOSE: &str = "tenant_verification";

/// One external verification source.
///
/// `verify` never fails: every outcome, including misconfiguration,
/// malformed input, rate limiting and transport faults, is a `ProviderResult`.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn verify(&self, record: &TenantRecord) -> ProviderResult;
}

/// Everything a provider client needs besides its own wire format.
#[derive(Clone)]
pub struct ProviderContext {
    kind: ProviderKind,
    http: ProviderHttpClient,
    base_url: String,
    api_key: Option<String>,
    limiter: Arc<RateLimiter>,
}

impl ProviderContext {
    pub fn new(
        kind: ProviderKind,
        config: &Config,
        http: ProviderHttpClient,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let provider = config.provider(kind);
        Self {
            kind,
            http,
            base_url: provider.base_url.clone(),
            api_key: provider.api_key.clone(),
            limiter,
        }
    }

    /// Usable credential, or `NotConfigured` when unset or the placeholder.
    fn credential(&self) -> Result<&str, VerificationError> {
        usable_credential(self.kind, self.api_key.as_deref())
            .ok_or(VerificationError::NotConfigured(self.kind))
    }

    fn admit(&self) -> Result<(), VerificationError> {
        if self.limiter.admit(self.kind) {
            Ok(())
        } else {
            Err(VerificationError::RateLimited(self.kind))
        }
    }

    /// Admits against the rate limiter, then POSTs `body` to `path`.
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        api_key: &str,
        path: &str,
        extra_headers: &[(&str, &str)],
        body: Value,
    ) -> Result<T, VerificationError> {
        let url = endpoint(&self.base_url, path)?;
        self.admit()?;
        self.http
            .post_json(self.kind, url, api_key, extra_headers, &body)
            .await
    }

    /// Folds a client's outcome into the uniform result, logging failures.
    fn settle(&self, outcome: Result<ProviderResult, VerificationError>) -> ProviderResult {
        match outcome {
            Ok(result) => {
                tracing::info!(
                    "{}: verified={} confidence={}",
                    self.kind.source_name(),
                    result.verified,
                    result.confidence
                );
                result
            }
            Err(e @ VerificationError::NotConfigured(_)) => {
                tracing::info!("{} skipped: not configured", self.kind.source_name());
                ProviderResult::failure(self.kind, &e)
            }
            Err(e) => {
                tracing::warn!("{} verification error: {}", self.kind.source_name(), e);
                ProviderResult::failure(self.kind, &e)
            }
        }
    }
}

fn field(record_field: &Option<String>) -> Option<&str> {
    TenantRecord::present(record_field)
}

// Response fields are all `Option`: upstream schemas drift and send `null`
// for missing values, which must read as the default rather than fail decoding.

// ============ Identity Registry ============

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IdentityResponse {
    status: Option<String>,
    name: Option<String>,
    date_of_birth: Option<String>,
    address: Option<String>,
    gender: Option<String>,
    photo_url: Option<String>,
}

/// Identity-document registry client (12-digit national ID).
pub struct IdentityRegistryClient {
    ctx: ProviderContext,
}

impl IdentityRegistryClient {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    async fn check(&self, record: &TenantRecord) -> Result<ProviderResult, VerificationError> {
        let api_key = self.ctx.credential()?;
        let number = normalize_identity_number(field(&record.identity_number).unwrap_or_default())?;

        let data: IdentityResponse = self
            .ctx
            .call(
                api_key,
                "api/verify",
                &[("X-API-Version", "2.0")],
                json!({
                    "aadhaar_number": number,
                    "otp": Value::Null,
                    "consent": true,
                    "purpose": PURPOSE,
                }),
            )
            .await?;

        Ok(ProviderResult::success(
            ProviderKind::Identity,
            data.status.as_deref() == Some("success"),
            ProviderDetails::Identity(IdentityDetails {
                name: data.name,
                date_of_birth: data.date_of_birth,
                address: data.address,
                gender: data.gender,
                photo_url: data.photo_url,
            }),
        ))
    }
}

#[async_trait]
impl VerificationProvider for IdentityRegistryClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Identity
    }

    async fn verify(&self, record: &TenantRecord) -> ProviderResult {
        self.ctx.settle(self.check(record).await)
    }
}

// ============ Tax Registry ============

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TaxResponse {
    status: Option<String>,
    name: Option<String>,
    category: Option<String>,
}

/// Tax-ID registry client (10-character alphanumeric ID).
pub struct TaxRegistryClient {
    ctx: ProviderContext,
}

impl TaxRegistryClient {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    async fn check(&self, record: &TenantRecord) -> Result<ProviderResult, VerificationError> {
        let api_key = self.ctx.credential()?;
        let tax_id = normalize_tax_id(field(&record.tax_id).unwrap_or_default())?;

        let data: TaxResponse = self
            .ctx
            .call(
                api_key,
                "api/pan/verify",
                &[("X-API-Version", "1.0")],
                json!({
                    "pan_number": tax_id,
                    "purpose": PURPOSE,
                }),
            )
            .await?;

        let registry_status = data.status.unwrap_or_else(|| "unknown".to_string());
        Ok(ProviderResult::success(
            ProviderKind::Tax,
            registry_status == "active",
            ProviderDetails::Tax(TaxDetails {
                name: data.name,
                registry_status,
                category: data.category,
            }),
        ))
    }
}

#[async_trait]
impl VerificationProvider for TaxRegistryClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Tax
    }

    async fn verify(&self, record: &TenantRecord) -> ProviderResult {
        self.ctx.settle(self.check(record).await)
    }
}

// ============ Telecom Registry ============

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TelecomResponse {
    status: Option<String>,
    carrier: Option<String>,
    location: Option<String>,
    #[serde(rename = "type")]
    line_type: Option<String>,
}

/// Telecom subscriber registry client (10-digit phone number).
pub struct TelecomRegistryClient {
    ctx: ProviderContext,
}

impl TelecomRegistryClient {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    async fn check(&self, record: &TenantRecord) -> Result<ProviderResult, VerificationError> {
        let api_key = self.ctx.credential()?;
        let phone = normalize_phone(field(&record.phone_number).unwrap_or_default())?;

        let data: TelecomResponse = self
            .ctx
            .call(
                api_key,
                "api/phone/verify",
                &[],
                json!({
                    "phone_number": phone,
                    "purpose": PURPOSE,
                }),
            )
            .await?;

        Ok(ProviderResult::success(
            ProviderKind::Telecom,
            data.status.as_deref() == Some("active"),
            ProviderDetails::Telecom(TelecomDetails {
                carrier: data.carrier,
                location: data.location,
                line_type: data.line_type,
            }),
        ))
    }
}

#[async_trait]
impl VerificationProvider for TelecomRegistryClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Telecom
    }

    async fn verify(&self, record: &TenantRecord) -> ProviderResult {
        self.ctx.settle(self.check(record).await)
    }
}

// ============ Email Validator ============

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EmailResponse {
    status: Option<String>,
    disposable: Option<bool>,
}

/// Email validation service client.
pub struct EmailValidatorClient {
    ctx: ProviderContext,
}

impl EmailValidatorClient {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    async fn check(&self, record: &TenantRecord) -> Result<ProviderResult, VerificationError> {
        let api_key = self.ctx.credential()?;
        let email = validate_email(field(&record.email).unwrap_or_default())?;
        let domain = email.split_once('@').map(|(_, d)| d.to_string());

        let data: EmailResponse = self
            .ctx
            .call(
                api_key,
                "api/verify",
                &[],
                json!({
                    "email": email,
                    "purpose": PURPOSE,
                }),
            )
            .await?;

        Ok(ProviderResult::success(
            ProviderKind::Email,
            data.status.as_deref() == Some("valid"),
            ProviderDetails::Email(EmailDetails {
                domain,
                disposable: data.disposable.unwrap_or_default(),
            }),
        ))
    }
}

#[async_trait]
impl VerificationProvider for EmailValidatorClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Email
    }

    async fn verify(&self, record: &TenantRecord) -> ProviderResult {
        self.ctx.settle(self.check(record).await)
    }
}

// ============ Background Check ============

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BackgroundResponse {
    verified: Option<bool>,
    criminal_record: Option<bool>,
    court_cases: Option<u32>,
    pending_cases: Option<u32>,
    credit_score: Option<u32>,
    employment_status: Option<String>,
}

/// Background / criminal-record service client.
///
/// Keys off name, identity number, tax ID and phone jointly; any of them
/// may be absent and is sent as `null`.
pub struct BackgroundCheckClient {
    ctx: ProviderContext,
}

impl BackgroundCheckClient {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    async fn check(&self, record: &TenantRecord) -> Result<ProviderResult, VerificationError> {
        let api_key = self.ctx.credential()?;

        let data: BackgroundResponse = self
            .ctx
            .call(
                api_key,
                "api/background-check",
                &[],
                json!({
                    "name": field(&record.full_name),
                    "aadhaar": field(&record.identity_number),
                    "pan": field(&record.tax_id),
                    "phone": field(&record.phone_number),
                    "purpose": PURPOSE,
                }),
            )
            .await?;

        let criminal_record = data.criminal_record.unwrap_or_default();
        if criminal_record {
            tracing::warn!("Background check reported a criminal record");
        }

        Ok(ProviderResult::success(
            ProviderKind::Background,
            data.verified.unwrap_or_default(),
            ProviderDetails::Background(BackgroundDetails {
                criminal_record,
                court_cases: data.court_cases.unwrap_or_default(),
                pending_cases: data.pending_cases.unwrap_or_default(),
                credit_score: data.credit_score,
                employment_status: data.employment_status,
            }),
        ))
    }
}

#[async_trait]
impl VerificationProvider for BackgroundCheckClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Background
    }

    async fn verify(&self, record: &TenantRecord) -> ProviderResult {
        self.ctx.settle(self.check(record).await)
    }
}

// ============ Rental History ============

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RentalResponse {
    verified: Option<bool>,
    total_rentals: Option<u32>,
    current_rentals: Option<u32>,
    past_rentals: Option<u32>,
    issues: Option<Vec<Value>>,
    evictions: Option<u32>,
    late_payments: Option<u32>,
    average_rating: Option<f64>,
    last_rental: Option<Value>,
}

/// Rental-history service client.
pub struct RentalHistoryClient {
    ctx: ProviderContext,
}

impl RentalHistoryClient {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    async fn check(&self, record: &TenantRecord) -> Result<ProviderResult, VerificationError> {
        let api_key = self.ctx.credential()?;

        let data: RentalResponse = self
            .ctx
            .call(
                api_key,
                "api/rental-history",
                &[],
                json!({
                    "name": field(&record.full_name),
                    "phone": field(&record.phone_number),
                    "aadhaar": field(&record.identity_number),
                    "purpose": PURPOSE,
                }),
            )
            .await?;

        Ok(ProviderResult::success(
            ProviderKind::Rental,
            data.verified.unwrap_or_default(),
            ProviderDetails::Rental(RentalDetails {
                total_rentals: data.total_rentals.unwrap_or_default(),
                current_rentals: data.current_rentals.unwrap_or_default(),
                past_rentals: data.past_rentals.unwrap_or_default(),
                issues: data.issues.unwrap_or_default(),
                evictions: data.evictions.unwrap_or_default(),
                late_payments: data.late_payments.unwrap_or_default(),
                average_rating: data.average_rating,
                last_rental: data.last_rental,
            }),
        ))
    }
}

#[async_trait]
impl VerificationProvider for RentalHistoryClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Rental
    }

    async fn verify(&self, record: &TenantRecord) -> ProviderResult {
        self.ctx.settle(self.check(record).await)
    }
}

fn shared<P: VerificationProvider + 'static>(provider: P) -> Arc<dyn VerificationProvider> {
    Arc::new(provider)
}

/// Builds the six HTTP-backed clients sharing one HTTP client and one limiter.
pub fn build_providers(
    config: &Config,
    limiter: Arc<RateLimiter>,
) -> Result<Vec<Arc<dyn VerificationProvider>>, VerificationError> {
    let http = ProviderHttpClient::new(config.request_timeout)?;
    let ctx = |kind: ProviderKind| {
        ProviderContext::new(kind, config, http.clone(), Arc::clone(&limiter))
    };

    Ok(vec![
        shared(IdentityRegistryClient::new(ctx(ProviderKind::Identity))),
        shared(TaxRegistryClient::new(ctx(ProviderKind::Tax))),
        shared(TelecomRegistryClient::new(ctx(ProviderKind::Telecom))),
        shared(EmailValidatorClient::new(ctx(ProviderKind::Email))),
        shared(BackgroundCheckClient::new(ctx(ProviderKind::Background))),
        shared(RentalHistoryClient::new(ctx(ProviderKind::Rental))),
    ])
}
