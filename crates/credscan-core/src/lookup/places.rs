use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{fetch_json, LookupProvider};
use crate::request::AnalysisRequest;

const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com";
const FIND_PLACE_PATH: &str = "/maps/api/place/findplacefromtext/json";

/// Google Places "find place from text" lookup.
#[derive(Debug, Clone)]
pub struct PlacesLookup {
    http: Client,
    url: String,
    api_key: String,
}

impl PlacesLookup {
    pub fn new(http: Client, api_key: String, endpoint: Option<String>) -> Self {
        let base = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Self {
            http,
            url: format!("{}{}", base.trim_end_matches('/'), FIND_PLACE_PATH),
            api_key,
        }
    }
}

/// Free-text query: the address when given, otherwise the business name.
fn place_query(request: &AnalysisRequest) -> &str {
    request
        .address
        .as_deref()
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .unwrap_or(request.business_name.as_str())
}

#[async_trait]
impl LookupProvider for PlacesLookup {
    fn name(&self) -> &'static str {
        "places"
    }

    async fn lookup(&self, request: &AnalysisRequest) -> Option<Value> {
        let query = [
            ("input", place_query(request)),
            ("inputtype", "textquery"),
            ("key", self.api_key.as_str()),
        ];
        fetch_json(&self.http, self.name(), &self.url, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn query_prefers_address() {
        let mut request = AnalysisRequest::new("Acme", "acme.com");
        assert_eq!(place_query(&request), "Acme");
        request.address = Some("1 Main St, Springfield".into());
        assert_eq!(place_query(&request), "1 Main St, Springfield");
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn returns_json_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path(FIND_PLACE_PATH)
                .query_param("input", "Acme")
                .query_param("inputtype", "textquery")
                .query_param("key", "g-key");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"candidates":[],"status":"ZERO_RESULTS"}"#);
        });

        let lookup = PlacesLookup::new(Client::new(), "g-key".into(), Some(server.base_url()));
        let value = lookup
            .lookup(&AnalysisRequest::new("Acme", "acme.com"))
            .await
            .expect("json body");
        assert_eq!(value["status"], "ZERO_RESULTS");
        mock.assert();
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn failure_is_swallowed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(FIND_PLACE_PATH);
            then.status(403).body("denied");
        });

        let lookup = PlacesLookup::new(Client::new(), "g-key".into(), Some(server.base_url()));
        assert!(lookup
            .lookup(&AnalysisRequest::new("Acme", "acme.com"))
            .await
            .is_none());
    }
}
