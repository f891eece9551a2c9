use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::score::Legitimacy;

/// Outcome of one successful completion call. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: u32,
    #[serde(rename = "analysis")]
    pub analysis_text: String,
    pub legitimacy: Legitimacy,
}

/// Append the score and legitimacy band to the raw model text.
///
/// The raw text passes through untouched; nothing here validates it.
pub fn assemble(raw_text: &str, score: u32, legitimacy: Legitimacy) -> AnalysisResult {
    let analysis_text = format!(
        "{raw_text}\n\nScore: {score}\nCredibility Status: {}",
        legitimacy.description()
    );
    AnalysisResult {
        score,
        analysis_text,
        legitimacy,
    }
}

/// Format styles supported by [`render_result`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Produce a display string for an analysis result.
pub fn render_result(result: &AnalysisResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(result),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
    }
}

fn render_human(result: &AnalysisResult) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "Credibility Score: {}/100", result.score)?;
    writeln!(
        out,
        "Legitimacy: {:?} ({})",
        result.legitimacy,
        result.legitimacy.description()
    )?;
    writeln!(out)?;
    writeln!(out, "{}", display_text(&result.analysis_text))?;
    Ok(out)
}

/// Strip markdown emphasis and heading characters and relabel the first
/// "Credibility Score" heading for display.
pub fn display_text(analysis: &str) -> String {
    analysis
        .replacen("Credibility Score", "Scam Analysis", 1)
        .chars()
        .filter(|c| !matches!(c, '*' | '#'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_appends_score_and_status() {
        let result = assemble("Looks fine. Credibility score: 85", 85, Legitimacy::FullyCredible);
        assert_eq!(result.score, 85);
        assert_eq!(result.legitimacy, Legitimacy::FullyCredible);
        assert_eq!(
            result.analysis_text,
            "Looks fine. Credibility score: 85\n\nScore: 85\nCredibility Status: Fully legitimate and credible"
        );
    }

    #[test]
    fn assemble_passes_garbage_through() {
        let result = assemble("\u{0}<<>>", 0, Legitimacy::Scam);
        assert!(result.analysis_text.starts_with("\u{0}<<>>\n\nScore: 0\n"));
    }

    #[test]
    fn json_uses_wire_field_names() {
        let result = assemble("text", 42, Legitimacy::Neutral);
        let output = render_result(&result, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["score"], 42);
        assert_eq!(value["legitimacy"], "Neutral");
        assert!(value["analysis"].as_str().unwrap().starts_with("text"));
    }

    #[test]
    fn human_output_strips_markup() {
        let result = assemble("**Credibility Score:** 65\n## Reviews", 65, Legitimacy::LikelyTrustworthy);
        let output = render_result(&result, OutputFormat::Human).unwrap();
        assert!(output.starts_with("Credibility Score: 65/100\n"));
        assert!(output.contains("Legitimacy: LikelyTrustworthy"));
        assert!(output.contains("Scam Analysis: 65"));
        assert!(!output.contains('*'));
        assert!(!output.contains('#'));
    }
}
