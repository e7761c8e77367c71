use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::errors::VerificationError;
use crate::models::ProviderKind;

/// Shared HTTP client for all provider calls.
///
/// Cheap to clone; every clone shares one connection pool and the same
/// per-request timeout.
#[derive(Clone, Debug)]
pub struct ProviderHttpClient {
    client: reqwest::Client,
}

impl ProviderHttpClient {
    /// Creates a new `ProviderHttpClient`.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Upper bound on each request, connect through body.
    pub fn new(timeout: Duration) -> Result<Self, VerificationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                VerificationError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// POSTs a JSON body with a bearer credential and decodes the JSON reply.
    ///
    /// Network faults, timeouts, non-2xx statuses and undecodable bodies all
    /// come back as `VerificationError::Transport`.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        kind: ProviderKind,
        url: Url,
        api_key: &str,
        extra_headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<T, VerificationError> {
        let source = kind.source_name();
        tracing::debug!("POST {} for {}", url, source);

        let mut request = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| {
            let reason = if e.is_timeout() { "timed out" } else { "request failed" };
            tracing::error!("{} {}: {}", source, reason, e);
            VerificationError::Transport(format!("{} API {}: {}", source, reason, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("{} returned error {}: {}", source, status, error_text);
            return Err(VerificationError::Transport(format!(
                "{} API error: {}",
                source,
                status.as_u16()
            )));
        }

        response.json().await.map_err(|e| {
            VerificationError::Transport(format!("Failed to parse {} response: {}", source, e))
        })
    }
}

/// Joins a provider path suffix onto its configured base URL.
///
/// The base is treated as a directory whether or not it ends in `/`, so
/// `https://host/v1` + `api/verify` gives `https://host/v1/api/verify`.
pub fn endpoint(base_url: &str, path: &str) -> Result<Url, VerificationError> {
    let base = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };

    Url::parse(&base)
        .and_then(|url| url.join(path.trim_start_matches('/')))
        .map_err(|e| {
            VerificationError::Transport(format!("Failed to build URL from {}: {}", base_url, e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_with_or_without_trailing_slash() {
        assert_eq!(
            endpoint("https://resident.uidai.gov.in/", "api/verify")
                .unwrap()
                .as_str(),
            "https://resident.uidai.gov.in/api/verify"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:8080", "api/pan/verify")
                .unwrap()
                .as_str(),
            "http://127.0.0.1:8080/api/pan/verify"
        );
        assert_eq!(
            endpoint("https://host/v1", "/api/rental-history")
                .unwrap()
                .as_str(),
            "https://host/v1/api/rental-history"
        );
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        let err = endpoint("not a url", "api/verify").unwrap_err();
        assert!(matches!(err, VerificationError::Transport(_)));
    }

    #[tokio::test]
    async fn test_client_creation() {
        assert!(ProviderHttpClient::new(Duration::from_secs(5)).is_ok());
    }
}
