use std::fmt;
use std::time::Duration;

use crate::models::ProviderKind;

/// Connection settings for one verification provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL the provider's path suffix is joined onto.
    pub base_url: String,
    /// Bearer credential as supplied; may be empty or a placeholder.
    pub api_key: Option<String>,
    /// Requests admitted per one-hour window.
    pub rate_limit: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Upper bound on every outbound provider request.
    pub request_timeout: Duration,
    providers: [ProviderConfig; 6],
}

/// Environment key prefix for a provider (`<PREFIX>_BASE_URL`, `_API_KEY`, `_RATE_LIMIT`).
pub fn env_prefix(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Identity => "UIDAI",
        ProviderKind::Tax => "INCOMETAX",
        ProviderKind::Telecom => "TELECOM",
        ProviderKind::Email => "EMAIL",
        ProviderKind::Background => "POLICE",
        ProviderKind::Rental => "RENTAL",
    }
}

/// Credential value shipped in the configuration template; treated as absent.
pub fn placeholder_api_key(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Identity => "your_uidai_production_api_key_here",
        ProviderKind::Tax => "your_incometax_production_api_key_here",
        ProviderKind::Telecom => "your_telecom_production_api_key_here",
        ProviderKind::Email => "your_email_verification_production_api_key_here",
        ProviderKind::Background => "your_police_production_api_key_here",
        ProviderKind::Rental => "your_rental_database_production_api_key_here",
    }
}

fn default_base_url(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Identity => "https://resident.uidai.gov.in/",
        ProviderKind::Tax => "https://www.incometax.gov.in/",
        ProviderKind::Telecom => "https://www.trai.gov.in/",
        ProviderKind::Email => "https://api.email-validator.net/",
        ProviderKind::Background => "https://bprd.gov.in/",
        ProviderKind::Rental => "https://api.rentalverification.in/",
    }
}

fn default_rate_limit(kind: ProviderKind) -> u32 {
    match kind {
        ProviderKind::Identity => 100,
        ProviderKind::Tax => 50,
        ProviderKind::Telecom => 200,
        ProviderKind::Email => 100,
        ProviderKind::Background => 30,
        ProviderKind::Rental => 500,
    }
}

fn slot(kind: ProviderKind) -> usize {
    match kind {
        ProviderKind::Identity => 0,
        ProviderKind::Tax => 1,
        ProviderKind::Telecom => 2,
        ProviderKind::Email => 3,
        ProviderKind::Background => 4,
        ProviderKind::Rental => 5,
    }
}

impl fmt::Debug for ProviderConfig {
    /// Redacts the credential; only whether one is set is shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

impl ProviderConfig {
    /// Built-in settings for a provider: default URL and limit, no credential.
    pub fn defaults(kind: ProviderKind) -> Self {
        Self {
            base_url: default_base_url(kind).to_string(),
            api_key: None,
            rate_limit: default_rate_limit(kind),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment (and `.env` if present).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!(
            "Provider timeout: {}s",
            config.request_timeout.as_secs()
        );

        Ok(config)
    }

    /// Builds configuration from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = get("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?;

        let timeout_secs: u64 = match get("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    anyhow::anyhow!("PROVIDER_TIMEOUT_SECS must be a positive number of seconds")
                })?,
            None => 10,
        };

        let mut providers = ProviderKind::ALL.map(ProviderConfig::defaults);
        for kind in ProviderKind::ALL {
            let prefix = env_prefix(kind);
            let entry = &mut providers[slot(kind)];

            if let Some(url) = get(&format!("{}_BASE_URL", prefix)) {
                let url = url.trim().to_string();
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    anyhow::bail!("{}_BASE_URL must start with http:// or https://", prefix);
                }
                entry.base_url = url;
            }

            entry.api_key = get(&format!("{}_API_KEY", prefix)).map(|k| k.trim().to_string());

            if let Some(limit) = get(&format!("{}_RATE_LIMIT", prefix)) {
                entry.rate_limit = limit
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|l| *l > 0)
                    .ok_or_else(|| {
                        anyhow::anyhow!("{}_RATE_LIMIT must be a positive integer", prefix)
                    })?;
            }
        }

        Ok(Self {
            port,
            request_timeout: Duration::from_secs(timeout_secs),
            providers,
        })
    }

    pub fn provider(&self, kind: ProviderKind) -> &ProviderConfig {
        &self.providers[slot(kind)]
    }

    /// Replaces one provider's settings.
    pub fn with_provider(mut self, kind: ProviderKind, provider: ProviderConfig) -> Self {
        self.providers[slot(kind)] = provider;
        self
    }

    /// The usable credential for a provider, or `None` when unset or still the placeholder.
    pub fn credential(&self, kind: ProviderKind) -> Option<&str> {
        usable_credential(kind, self.provider(kind).api_key.as_deref())
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        self.credential(kind).is_some()
    }

    /// Logs which providers have usable credentials. Credentials themselves are never logged.
    pub fn log_status(&self) {
        let (configured, missing): (Vec<ProviderKind>, Vec<ProviderKind>) = ProviderKind::ALL
            .into_iter()
            .partition(|kind| self.is_configured(*kind));

        let names = |kinds: &[ProviderKind]| {
            if kinds.is_empty() {
                "None".to_string()
            } else {
                kinds
                    .iter()
                    .map(|k| k.source_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        };

        tracing::info!("Configured services: {}", names(&configured));
        if !missing.is_empty() {
            tracing::warn!("Not configured services: {}", names(&missing));
        }
        for kind in ProviderKind::ALL {
            let provider = self.provider(kind);
            tracing::debug!(
                "{} -> {} (limit {}/h)",
                kind,
                provider.base_url,
                provider.rate_limit
            );
        }
    }
}

/// Applies the unset/placeholder rule to a raw credential.
pub fn usable_credential(kind: ProviderKind, api_key: Option<&str>) -> Option<&str> {
    api_key
        .map(str::trim)
        .filter(|key| !key.is_empty() && *key != placeholder_api_key(kind))
}
