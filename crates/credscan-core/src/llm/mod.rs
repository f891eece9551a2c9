mod anthropic;
mod openai;
mod settings;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;
pub use settings::{LlmSettings, ProviderKind};

/// Text-completion service that turns a prompt into free-form text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `prompt` as a single user message and return the model's reply verbatim.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Offline client used when no provider is configured.
#[derive(Debug, Default, Clone)]
pub struct NoopCompletionClient;

#[async_trait]
impl CompletionClient for NoopCompletionClient {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(NOOP_REPLY.to_string())
    }
}

const NOOP_REPLY: &str =
    "Completion provider not configured; no credibility assessment was performed.";

/// Build the client selected by `settings.provider`.
pub fn build_client(settings: &LlmSettings) -> Result<Arc<dyn CompletionClient>> {
    let client: Arc<dyn CompletionClient> = match settings.kind()? {
        ProviderKind::OpenAi => Arc::new(OpenAiClient::new(settings)?),
        ProviderKind::Anthropic => Arc::new(AnthropicClient::new(settings)?),
        ProviderKind::Noop => Arc::new(NoopCompletionClient),
    };
    Ok(client)
}

/// Request timeout for provider calls. `None` leaves it to the transport.
pub(crate) fn request_timeout(settings: &LlmSettings) -> Option<Duration> {
    settings.timeout_secs.map(Duration::from_secs)
}

/// HTTP client shared by the provider implementations.
pub(crate) fn http_client(settings: &LlmSettings, provider: &str) -> Result<Client> {
    let mut builder = Client::builder().user_agent("credscan/0.3");
    if let Some(timeout) = request_timeout(settings) {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .with_context(|| format!("failed to build {provider} HTTP client"))
}

/// Trim long text to `max_chars`, appending an ellipsis. Used for error bodies in logs.
pub(crate) fn truncate(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    input.chars().take(max_chars).collect::<String>() + "…"
}
