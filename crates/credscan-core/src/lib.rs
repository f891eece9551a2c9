pub mod analyzer;
pub mod cache;
pub mod llm;
pub mod lookup;
pub mod prompt;
pub mod report;
pub mod request;
pub mod score;
pub mod session;

pub use analyzer::{AnalysisError, CredibilityAnalyzer, GENERIC_FAILURE_MESSAGE};
pub use cache::{CachePolicy, Clock, ManualClock, ResultCache, SubmissionThrottle, SystemClock};
pub use llm::{build_client, CompletionClient, LlmSettings, NoopCompletionClient};
pub use lookup::{LookupProvider, LookupSettings, Lookups};
pub use prompt::{build_prompt, LookupData};
pub use report::{assemble, render_result, AnalysisResult, OutputFormat};
pub use request::{AnalysisRequest, ValidationError};
pub use score::{categorize, extract_score, Legitimacy, LegitimacyThresholds};
pub use session::{Submission, SubmissionSession, SubmissionState, SubmitError};
