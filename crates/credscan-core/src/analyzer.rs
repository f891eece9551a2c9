use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::llm::CompletionClient;
use crate::lookup::Lookups;
use crate::prompt::build_prompt;
use crate::report::{assemble, AnalysisResult};
use crate::request::{AnalysisRequest, ValidationError};
use crate::score::{extract_score, Legitimacy, LegitimacyThresholds, MAX_SCORE};

/// Message surfaced for every completion failure; details stay in the log.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred during the analysis.";

/// Errors that end a single analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("An error occurred during the analysis.")]
    Completion { detail: String },
}

/// Validates a request, gathers lookups, prompts the completion service and scores the reply.
#[derive(Clone)]
pub struct CredibilityAnalyzer {
    completion: Arc<dyn CompletionClient>,
    lookups: Lookups,
    thresholds: LegitimacyThresholds,
}

impl CredibilityAnalyzer {
    pub fn new(completion: Arc<dyn CompletionClient>) -> Self {
        Self {
            completion,
            lookups: Lookups::default(),
            thresholds: LegitimacyThresholds::default(),
        }
    }

    pub fn with_lookups(mut self, lookups: Lookups) -> Self {
        self.lookups = lookups;
        self
    }

    pub fn with_thresholds(mut self, thresholds: LegitimacyThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Normalize then validate. Pure; no network access.
    pub fn prepare(&self, request: AnalysisRequest) -> Result<AnalysisRequest, ValidationError> {
        let request = request.normalized();
        request.validate()?;
        Ok(request)
    }

    /// Run the network half of the pipeline on an already prepared request.
    #[instrument(name = "analyze_business", skip(self, request), fields(domain = %request.domain))]
    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let lookups = self.lookups.gather(request).await;
        let prompt = build_prompt(request, &lookups);

        let raw = self.completion.complete(&prompt).await.map_err(|err| {
            let detail = format!("{err:#}");
            error!(%detail, "completion request failed");
            AnalysisError::Completion { detail }
        })?;

        let score = extract_score(&raw).min(MAX_SCORE);
        let legitimacy = Legitimacy::from_score_with_thresholds(score, &self.thresholds);
        debug!(score, ?legitimacy, "analysis completed");
        Ok(assemble(&raw, score, legitimacy))
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let request = self.prepare(request)?;
        self.run(&request).await
    }
}
