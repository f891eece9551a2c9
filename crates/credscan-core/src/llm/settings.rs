use anyhow::{bail, Context, Result};
use std::collections::HashMap;

/// Completion providers the service can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Noop,
}

/// Environment-driven configuration for the completion client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub provider: String,
    pub api_key: String,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            api_key: String::new(),
            endpoint: None,
            model: None,
            timeout_secs: None,
        }
    }
}

impl LlmSettings {
    pub const PROVIDER_ENV: &'static str = "CREDSCAN_PROVIDER";
    pub const API_KEY_ENV: &'static str = "CREDSCAN_API_KEY";
    pub const FALLBACK_API_KEY_ENV: &'static str = "OPENAI_API_KEY";
    pub const ENDPOINT_ENV: &'static str = "CREDSCAN_ENDPOINT";
    pub const MODEL_ENV: &'static str = "CREDSCAN_MODEL";
    pub const TIMEOUT_ENV: &'static str = "CREDSCAN_TIMEOUT_SECS";

    /// Load settings from a map of environment-style variables.
    ///
    /// * `CREDSCAN_PROVIDER` — `openai` (default), `anthropic` or `noop`.
    /// * `CREDSCAN_API_KEY`  — API key; `OPENAI_API_KEY` is accepted for the OpenAI provider.
    /// * `CREDSCAN_ENDPOINT` — Optional custom base URL.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let non_blank = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let provider = non_blank(Self::PROVIDER_ENV).unwrap_or_else(|| "openai".to_string());
        let kind = parse_kind(&provider)?;
        let api_key = match kind {
            ProviderKind::Noop => non_blank(Self::API_KEY_ENV).unwrap_or_default(),
            ProviderKind::OpenAi => non_blank(Self::API_KEY_ENV)
                .or_else(|| non_blank(Self::FALLBACK_API_KEY_ENV))
                .with_context(|| {
                    format!(
                        "environment variable {} (or {}) must be set for provider `{}`",
                        Self::API_KEY_ENV,
                        Self::FALLBACK_API_KEY_ENV,
                        provider
                    )
                })?,
            ProviderKind::Anthropic => non_blank(Self::API_KEY_ENV).with_context(|| {
                format!(
                    "environment variable {} must be set for provider `{}`",
                    Self::API_KEY_ENV,
                    provider
                )
            })?,
        };
        let timeout_secs = match non_blank(Self::TIMEOUT_ENV) {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("{} must be a whole number of seconds", Self::TIMEOUT_ENV))?,
            ),
            None => None,
        };

        Ok(Self {
            provider,
            api_key,
            endpoint: non_blank(Self::ENDPOINT_ENV),
            model: non_blank(Self::MODEL_ENV),
            timeout_secs,
        })
    }

    pub fn kind(&self) -> Result<ProviderKind> {
        parse_kind(&self.provider)
    }
}

fn parse_kind(provider: &str) -> Result<ProviderKind> {
    match provider.trim().to_ascii_lowercase().as_str() {
        "openai" => Ok(ProviderKind::OpenAi),
        "anthropic" => Ok(ProviderKind::Anthropic),
        "noop" => Ok(ProviderKind::Noop),
        other => bail!("unsupported completion provider `{other}` (expected openai, anthropic or noop)"),
    }
}
