use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::analyzer::{AnalysisError, CredibilityAnalyzer};
use crate::cache::{CachePolicy, Clock, ResultCache, SubmissionThrottle, SystemClock};
use crate::report::AnalysisResult;
use crate::request::{AnalysisRequest, ValidationError};

/// Where a submission currently is. Every submission ends back at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    CacheCheck,
    Requesting,
}

/// A successful submission, either served locally or freshly analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Cached(AnalysisResult),
    Fresh(AnalysisResult),
}

impl Submission {
    pub fn result(&self) -> &AnalysisResult {
        match self {
            Self::Cached(result) | Self::Fresh(result) => result,
        }
    }

    pub fn into_result(self) -> AnalysisResult {
        match self {
            Self::Cached(result) | Self::Fresh(result) => result,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached(_))
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("please wait {}s before submitting again", .retry_after.as_secs().max(1))]
    Throttled { retry_after: Duration },
    #[error(transparent)]
    Failed(AnalysisError),
}

/// Client-side driver: one submission at a time, deduplicated per domain and throttled globally.
pub struct SubmissionSession {
    analyzer: CredibilityAnalyzer,
    cache: ResultCache,
    throttle: SubmissionThrottle,
    state: SubmissionState,
    last_stage: SubmissionState,
}

impl SubmissionSession {
    pub fn new(analyzer: CredibilityAnalyzer, policy: &CachePolicy) -> Self {
        Self::with_clock(analyzer, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        analyzer: CredibilityAnalyzer,
        policy: &CachePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            analyzer,
            cache: ResultCache::new(policy, clock.clone()),
            throttle: SubmissionThrottle::new(policy.cooldown, clock),
            state: SubmissionState::Idle,
            last_stage: SubmissionState::Idle,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Furthest state reached by the most recent submission.
    pub fn last_stage(&self) -> SubmissionState {
        self.last_stage
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Drive one request through validation, cache check and, on a miss, the analyzer.
    pub async fn submit(&mut self, request: AnalysisRequest) -> Result<Submission, SubmitError> {
        let outcome = self.drive(request).await;
        self.last_stage = self.state;
        self.enter(SubmissionState::Idle);
        outcome
    }

    fn enter(&mut self, next: SubmissionState) {
        debug!(from = ?self.state, to = ?next, "submission state");
        self.state = next;
    }

    async fn drive(&mut self, request: AnalysisRequest) -> Result<Submission, SubmitError> {
        self.enter(SubmissionState::Validating);
        let request = self.analyzer.prepare(request)?;

        self.enter(SubmissionState::CacheCheck);
        if let Some(result) = self.cache.lookup(&request.domain) {
            info!(domain = %request.domain, "serving cached analysis");
            return Ok(Submission::Cached(result));
        }

        if let Err(retry_after) = self.throttle.acquire() {
            debug!(?retry_after, "submission throttled");
            return Err(SubmitError::Throttled { retry_after });
        }

        self.enter(SubmissionState::Requesting);
        let result = self
            .analyzer
            .run(&request)
            .await
            .map_err(SubmitError::Failed)?;
        self.cache.store(&request.domain, result.clone());
        Ok(Submission::Fresh(result))
    }

    /// Periodic eviction of stale cache entries.
    pub fn sweep(&mut self) -> usize {
        self.cache.sweep()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::llm::CompletionClient;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl CompletionClient for CountingClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                bail!("upstream unavailable");
            }
            Ok("Credibility Score: 66".to_string())
        }
    }

    fn session() -> (SubmissionSession, Arc<CountingClient>, Arc<ManualClock>) {
        let client = Arc::new(CountingClient::default());
        let clock = Arc::new(ManualClock::new());
        let session = SubmissionSession::with_clock(
            CredibilityAnalyzer::new(client.clone()),
            &CachePolicy::default(),
            clock.clone(),
        );
        (session, client, clock)
    }

    #[tokio::test]
    async fn repeat_domain_is_served_from_cache() {
        let (mut session, client, clock) = session();
        let first = session
            .submit(AnalysisRequest::new("Acme", "example.com"))
            .await
            .unwrap();
        assert!(!first.is_cached());

        clock.advance(Duration::from_secs(5));
        let second = session
            .submit(AnalysisRequest::new("Acme", "https://www.example.com"))
            .await
            .unwrap();
        assert!(second.is_cached());
        assert_eq!(first.result(), second.result());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.state(), SubmissionState::Idle);
        assert_eq!(session.last_stage(), SubmissionState::CacheCheck);
    }

    #[tokio::test]
    async fn other_domain_within_cooldown_is_throttled() {
        let (mut session, client, clock) = session();
        session
            .submit(AnalysisRequest::new("Acme", "acme.com"))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(12));
        let err = session
            .submit(AnalysisRequest::new("Globex", "globex.com"))
            .await
            .unwrap_err();
        match err {
            SubmitError::Throttled { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(18))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.last_stage(), SubmissionState::CacheCheck);

        clock.advance(Duration::from_secs(18));
        let fresh = session
            .submit(AnalysisRequest::new("Globex", "globex.com"))
            .await
            .unwrap();
        assert!(!fresh.is_cached());
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stale_entry_triggers_new_request() {
        let (mut session, client, clock) = session();
        session
            .submit(AnalysisRequest::new("Acme", "acme.com"))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(10 * 60));
        let again = session
            .submit(AnalysisRequest::new("Acme", "acme.com"))
            .await
            .unwrap();
        assert!(!again.is_cached());
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalid_request_neither_calls_nor_throttles() {
        let (mut session, client, _clock) = session();
        let err = session
            .submit(AnalysisRequest::new("", "acme.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.last_stage(), SubmissionState::Validating);

        assert!(session
            .submit(AnalysisRequest::new("Acme", "acme.com"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn failure_leaves_cache_unchanged() {
        let (mut session, client, clock) = session();
        client.fail.store(true, Ordering::SeqCst);
        let err = session
            .submit(AnalysisRequest::new("Acme", "acme.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Failed(AnalysisError::Completion { .. })));
        assert!(session.cache().is_empty());
        assert_eq!(session.state(), SubmissionState::Idle);
        assert_eq!(session.last_stage(), SubmissionState::Requesting);

        clock.advance(Duration::from_secs(30));
        client.fail.store(false, Ordering::SeqCst);
        assert!(session
            .submit(AnalysisRequest::new("Acme", "acme.com"))
            .await
            .is_ok());
        assert_eq!(session.cache().len(), 1);
    }

    #[tokio::test]
    async fn sweep_evicts_expired_results() {
        let (mut session, _client, clock) = session();
        session
            .submit(AnalysisRequest::new("Acme", "acme.com"))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(11 * 60));
        assert_eq!(session.sweep(), 1);
        assert!(session.cache().is_empty());
    }
}
