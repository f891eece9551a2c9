use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use credscan_core::cache::DEFAULT_SWEEP_INTERVAL;
use credscan_core::{CachePolicy, LlmSettings, LookupSettings};
use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const PORT_ENV: &str = "PORT";

/// Optional configuration file layout. Every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub llm: LlmSection,
    pub lookups: LookupSection,
    pub server: ServerSection,
    pub cache: CacheSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub provider: Option<String>,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LookupSection {
    pub google_api_key: Option<String>,
    pub places_endpoint: Option<String>,
    pub whois_api_key: Option<String>,
    pub whois_endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Durations use humantime syntax, e.g. `"10m"` or `"30s"`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub freshness_window: Option<String>,
    pub max_entries: Option<usize>,
    pub cooldown: Option<String>,
    pub sweep_interval: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("failed to read config file {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// File values expressed as the environment variables they stand in for.
    fn env_overlay(&self) -> HashMap<String, String> {
        let pairs = [
            (LlmSettings::PROVIDER_ENV, self.llm.provider.clone()),
            (LlmSettings::API_KEY_ENV, self.llm.api_key.clone()),
            (LlmSettings::ENDPOINT_ENV, self.llm.endpoint.clone()),
            (LlmSettings::MODEL_ENV, self.llm.model.clone()),
            (
                LlmSettings::TIMEOUT_ENV,
                self.llm.timeout_secs.map(|secs| secs.to_string()),
            ),
            (
                LookupSettings::PLACES_KEY_ENV,
                self.lookups.google_api_key.clone(),
            ),
            (
                LookupSettings::PLACES_ENDPOINT_ENV,
                self.lookups.places_endpoint.clone(),
            ),
            (
                LookupSettings::WHOIS_KEY_ENV,
                self.lookups.whois_api_key.clone(),
            ),
            (
                LookupSettings::WHOIS_ENDPOINT_ENV,
                self.lookups.whois_endpoint.clone(),
            ),
            (PORT_ENV, self.server.port.map(|port| port.to_string())),
        ];
        pairs
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key.to_string(), value)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmSettings,
    pub lookups: LookupSettings,
    pub server: ServerConfig,
    pub cache: CachePolicy,
    pub sweep_interval: Duration,
}

impl AppConfig {
    /// Merge the optional config file with the process environment; the environment wins.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::from_parts(file, std::env::vars().collect())
    }

    fn from_parts(file: FileConfig, env: HashMap<String, String>) -> Result<Self> {
        let mut vars = file.env_overlay();
        vars.extend(env.into_iter().filter(|(_, value)| !value.trim().is_empty()));

        let llm = LlmSettings::from_vars(vars.clone())?;
        let lookups = LookupSettings::from_vars(&vars);

        let port = match vars.get(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("{PORT_ENV} must be a valid port number"))?,
            None => DEFAULT_PORT,
        };
        let server = ServerConfig {
            host: file
                .server
                .host
                .clone()
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        };

        let defaults = CachePolicy::default();
        let cache = CachePolicy {
            freshness_window: parse_nonzero_duration(
                "cache.freshness_window",
                file.cache.freshness_window.as_deref(),
                defaults.freshness_window,
            )?,
            max_entries: file.cache.max_entries.unwrap_or(defaults.max_entries),
            cooldown: parse_duration(
                "cache.cooldown",
                file.cache.cooldown.as_deref(),
                defaults.cooldown,
            )?,
        };
        let sweep_interval = parse_nonzero_duration(
            "cache.sweep_interval",
            file.cache.sweep_interval.as_deref(),
            DEFAULT_SWEEP_INTERVAL,
        )?;

        Ok(Self {
            llm,
            lookups,
            server,
            cache,
            sweep_interval,
        })
    }
}

fn parse_duration(key: &str, raw: Option<&str>, default: Duration) -> Result<Duration> {
    match raw {
        Some(raw) => humantime::parse_duration(raw.trim())
            .with_context(|| format!("`{key}` must be a duration like \"30s\" or \"10m\"")),
        None => Ok(default),
    }
}

fn parse_nonzero_duration(key: &str, raw: Option<&str>, default: Duration) -> Result<Duration> {
    let duration = parse_duration(key, raw, default)?;
    if duration.is_zero() {
        bail!("`{key}` must be greater than zero");
    }
    Ok(duration)
}
