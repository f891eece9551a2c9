mod places;
mod whois;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::prompt::LookupData;
use crate::request::AnalysisRequest;

pub use places::PlacesLookup;
pub use whois::WhoisLookup;

/// Third-party data source consulted before prompting.
///
/// Implementations never fail: any transport, status or decode problem is logged and
/// reported as `None` so the analysis proceeds without that data.
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn lookup(&self, request: &AnalysisRequest) -> Option<Value>;
}

/// API keys and endpoint overrides for the lookup services.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupSettings {
    pub places_api_key: Option<String>,
    pub places_endpoint: Option<String>,
    pub whois_api_key: Option<String>,
    pub whois_endpoint: Option<String>,
}

impl LookupSettings {
    pub const PLACES_KEY_ENV: &'static str = "GOOGLE_API_KEY";
    pub const PLACES_ENDPOINT_ENV: &'static str = "CREDSCAN_PLACES_ENDPOINT";
    pub const WHOIS_KEY_ENV: &'static str = "WHOIS_API_KEY";
    pub const WHOIS_ENDPOINT_ENV: &'static str = "CREDSCAN_WHOIS_ENDPOINT";

    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let non_blank = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            places_api_key: non_blank(Self::PLACES_KEY_ENV),
            places_endpoint: non_blank(Self::PLACES_ENDPOINT_ENV),
            whois_api_key: non_blank(Self::WHOIS_KEY_ENV),
            whois_endpoint: non_blank(Self::WHOIS_ENDPOINT_ENV),
        }
    }
}

/// The optional lookups wired into an analyzer. A missing provider yields absent data.
#[derive(Clone, Default)]
pub struct Lookups {
    pub places: Option<Arc<dyn LookupProvider>>,
    pub whois: Option<Arc<dyn LookupProvider>>,
}

impl Lookups {
    /// Enable each lookup whose API key is configured.
    pub fn from_settings(settings: &LookupSettings) -> Result<Self> {
        let http = Client::builder()
            .user_agent("credscan/0.3")
            .build()
            .context("failed to build lookup HTTP client")?;

        let places = settings.places_api_key.as_ref().map(|key| {
            Arc::new(PlacesLookup::new(
                http.clone(),
                key.clone(),
                settings.places_endpoint.clone(),
            )) as Arc<dyn LookupProvider>
        });
        let whois = settings.whois_api_key.as_ref().map(|key| {
            Arc::new(WhoisLookup::new(
                http.clone(),
                key.clone(),
                settings.whois_endpoint.clone(),
            )) as Arc<dyn LookupProvider>
        });
        if places.is_none() {
            tracing::info!("{} not set; places lookup disabled", LookupSettings::PLACES_KEY_ENV);
        }
        if whois.is_none() {
            tracing::info!("{} not set; whois lookup disabled", LookupSettings::WHOIS_KEY_ENV);
        }
        Ok(Self { places, whois })
    }

    /// Run every configured lookup concurrently.
    pub async fn gather(&self, request: &AnalysisRequest) -> LookupData {
        let (places, whois) = tokio::join!(
            run_optional(self.places.as_deref(), request),
            run_optional(self.whois.as_deref(), request),
        );
        LookupData { places, whois }
    }
}

async fn run_optional(
    provider: Option<&dyn LookupProvider>,
    request: &AnalysisRequest,
) -> Option<Value> {
    provider?.lookup(request).await
}

/// Issue a GET and decode JSON, logging and swallowing any failure.
pub(crate) async fn fetch_json(
    http: &Client,
    source: &'static str,
    url: &str,
    query: &[(&str, &str)],
) -> Option<Value> {
    let response = match http.get(url).query(query).send().await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(source, error = %err, "lookup request failed");
            return None;
        }
    };
    let status = response.status();
    if !status.is_success() {
        tracing::warn!(source, %status, "lookup returned error status");
        return None;
    }
    match response.json::<Value>().await {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(source, error = %err, "lookup returned undecodable body");
            None
        }
    }
}
