use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SCORE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)credibility score[:\s]*?(\d+)").expect("score pattern is valid")
});

/// Upper bound of the credibility scale.
pub const MAX_SCORE: u32 = 100;

/// Pull the first "credibility score" figure out of free-form model output.
///
/// Returns 0 when the phrase is absent or not followed by digits. Digit runs too
/// large for `u32` saturate rather than fail.
pub fn extract_score(text: &str) -> u32 {
    SCORE_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|digits| digits.as_str().parse::<u32>().unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Lower bounds of the upper four legitimacy bands. Each band is left-closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegitimacyThresholds {
    pub caution: u32,
    pub neutral: u32,
    pub likely_trustworthy: u32,
    pub fully_credible: u32,
}

impl Default for LegitimacyThresholds {
    fn default() -> Self {
        Self {
            caution: 20,
            neutral: 40,
            likely_trustworthy: 60,
            fully_credible: 80,
        }
    }
}

/// The five fixed legitimacy bands derived from a credibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Legitimacy {
    Scam,
    Caution,
    Neutral,
    LikelyTrustworthy,
    FullyCredible,
}

impl Legitimacy {
    /// Map a score onto the default rubric.
    pub fn from_score(score: u32) -> Self {
        Self::from_score_with_thresholds(score, &LegitimacyThresholds::default())
    }

    pub fn from_score_with_thresholds(score: u32, thresholds: &LegitimacyThresholds) -> Self {
        if score >= thresholds.fully_credible {
            Self::FullyCredible
        } else if score >= thresholds.likely_trustworthy {
            Self::LikelyTrustworthy
        } else if score >= thresholds.neutral {
            Self::Neutral
        } else if score >= thresholds.caution {
            Self::Caution
        } else {
            Self::Scam
        }
    }

    /// Human-readable description shown alongside the score.
    pub fn description(self) -> &'static str {
        match self {
            Self::Scam => "Likely a scam",
            Self::Caution => "Be cautious, potential red flags exist",
            Self::Neutral => "Neutral, insufficient evidence to strongly support or discredit",
            Self::LikelyTrustworthy => "Likely trustworthy with some room for improvement",
            Self::FullyCredible => "Fully legitimate and credible",
        }
    }

    /// Whether the band should be presented as a warning.
    pub fn is_warning(self) -> bool {
        matches!(self, Self::Scam | Self::Caution)
    }
}

/// Map a 0-100 score onto its legitimacy band using the default thresholds.
pub fn categorize(score: u32) -> Legitimacy {
    Legitimacy::from_score(score)
}
