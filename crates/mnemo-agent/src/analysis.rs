// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-entry analysis: model-generated summary and importance score.

use std::sync::Arc;

use mnemo_core::error::MnemoError;
use mnemo_core::traits::GenerationAdapter;

/// Importance used when the model response has no parseable score.
const DEFAULT_IMPORTANCE: f32 = 0.5;

/// Asks the generation backend to summarize a log entry and rate its
/// importance.
pub struct EntryAnalyzer {
    provider: Arc<dyn GenerationAdapter>,
}

impl EntryAnalyzer {
    pub fn new(provider: Arc<dyn GenerationAdapter>) -> Self {
        Self { provider }
    }

    /// Returns `(summary, importance)` for the entry text. Importance is
    /// clamped to [0, 1]; unparseable responses degrade to an empty
    /// summary and the default importance.
    pub async fn analyze(&self, text: &str, date: &str) -> Result<(String, f32), MnemoError> {
        let prompt = format!(
            "Analyze this log entry from {date} and provide:\n\
             1. A concise summary (max 2 sentences)\n\
             2. An importance score between 0 and 1 (where 1 is most important)\n\n\
             Log entry:\n{text}\n\n\
             Format your response as:\n\
             SUMMARY: <your summary>\n\
             IMPORTANCE: <score>\n\n\
             Focus on key events, decisions, and insights. Consider the entry's \
             significance in the context of personal or professional development."
        );

        let response = self.provider.generate(&prompt).await?;
        Ok(parse_analysis(&response))
    }
}

/// Parses `SUMMARY:` and `IMPORTANCE:` lines; anything else is ignored.
fn parse_analysis(response: &str) -> (String, f32) {
    let mut summary = String::new();
    let mut importance = DEFAULT_IMPORTANCE;

    for line in response.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("SUMMARY:") {
            summary = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("IMPORTANCE:") {
            if let Ok(score) = rest.trim().parse::<f32>() {
                importance = score.clamp(0.0, 1.0);
            }
        }
    }

    (summary, importance)
}
