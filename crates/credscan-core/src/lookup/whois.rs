use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{fetch_json, LookupProvider};
use crate::request::AnalysisRequest;

const DEFAULT_ENDPOINT: &str = "https://www.whoisxmlapi.com";
const WHOIS_PATH: &str = "/whoisserver/WhoisService";

/// Domain-registration lookup against the WHOIS XML API.
#[derive(Debug, Clone)]
pub struct WhoisLookup {
    http: Client,
    url: String,
    api_key: String,
}

impl WhoisLookup {
    pub fn new(http: Client, api_key: String, endpoint: Option<String>) -> Self {
        let base = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Self {
            http,
            url: format!("{}{}", base.trim_end_matches('/'), WHOIS_PATH),
            api_key,
        }
    }
}

#[async_trait]
impl LookupProvider for WhoisLookup {
    fn name(&self) -> &'static str {
        "whois"
    }

    async fn lookup(&self, request: &AnalysisRequest) -> Option<Value> {
        let query = [
            ("apiKey", self.api_key.as_str()),
            ("domainName", request.domain.as_str()),
            ("outputFormat", "JSON"),
        ];
        fetch_json(&self.http, self.name(), &self.url, &query).await
    }
}
