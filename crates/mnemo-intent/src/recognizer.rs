// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The five-stage intent recognition pipeline.
//!
//! Pattern and keyword stages see only the current message; the model
//! stage also sees the last three conversation turns. The model stage is
//! skipped for short messages that pattern matching already resolved to
//! more than one candidate. Malformed model output degrades to fewer
//! signals, never to an error.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use mnemo_core::error::MnemoError;
use mnemo_core::traits::GenerationAdapter;
use mnemo_core::types::{ChatTurn, Role};
use tracing::debug;

use crate::entities::extract_entities;
use crate::fusion::fuse;
use crate::patterns::{keyword_scores, pattern_scores};
use crate::types::{Intent, IntentResult};

/// Message length above which the model stage always runs.
const MODEL_STAGE_MIN_CHARS: usize = 15;
/// Turns of history shown to the model stage.
const MODEL_STAGE_HISTORY: usize = 3;
/// Pattern hits above this confidence are surfaced to the model stage.
const HIGH_CONFIDENCE_HINT: f64 = 0.5;

/// Classifies messages by fusing rule patterns, keyword statistics, and a
/// model-based stage into one confidence-weighted decision.
///
/// Deterministic: identical inputs plus an identical model response
/// always produce the same result.
pub struct IntentRecognizer {
    provider: Arc<dyn GenerationAdapter>,
}

impl IntentRecognizer {
    pub fn new(provider: Arc<dyn GenerationAdapter>) -> Self {
        Self { provider }
    }

    /// Runs the full pipeline for one message.
    ///
    /// Provider transport failures propagate; the conversation layer
    /// turns those into its apology path.
    pub async fn recognize(
        &self,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<IntentResult, MnemoError> {
        let pattern = pattern_scores(message);
        let entities = extract_entities(message);
        let keyword = keyword_scores(message);

        // Only consult the model when the message is long enough to carry
        // nuance or the pattern stage was inconclusive.
        let model = if message.chars().count() > MODEL_STAGE_MIN_CHARS || pattern.len() <= 1 {
            let prompt = build_model_prompt(message, history, &pattern);
            let response = self.provider.generate(&prompt).await?;
            Some(parse_model_response(&response))
        } else {
            None
        };

        let fused = fuse(&pattern, &keyword, model.as_ref());
        debug!(
            primary = %fused.primary,
            confidence = fused.confidence,
            "intent recognized"
        );

        Ok(IntentResult {
            primary_intent: fused.primary,
            secondary_intents: fused.secondary,
            entities,
            confidence: fused.confidence,
            confidence_breakdown: fused.breakdown,
        })
    }
}

/// Builds the model-stage prompt: recent turns, high-confidence pattern
/// hints, the message, and the category list with the required line
/// format.
fn build_model_prompt(
    message: &str,
    history: &[ChatTurn],
    pattern: &BTreeMap<Intent, f64>,
) -> String {
    let mut prompt = String::new();

    if !history.is_empty() {
        prompt.push_str("Recent conversation:\n");
        let start = history.len().saturating_sub(MODEL_STAGE_HISTORY);
        for turn in &history[start..] {
            let role = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            prompt.push_str(&format!("{role}: {}\n", turn.content));
        }
        prompt.push('\n');
    }

    let hints: Vec<String> = pattern
        .iter()
        .filter(|(_, confidence)| **confidence > HIGH_CONFIDENCE_HINT)
        .map(|(intent, confidence)| format!("- {intent} (confidence: {confidence:.2})"))
        .collect();
    if !hints.is_empty() {
        prompt.push_str("Initial analysis detected these potential intents:\n");
        for hint in hints {
            prompt.push_str(&hint);
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("Analyze this user message: \"{message}\"\n\n"));
    prompt.push_str(
        "Determine the user's intent from these categories:\n\
         - GREETING: General greeting or small talk\n\
         - QUESTION: General information seeking\n\
         - RETRIEVAL: Specific memory/knowledge retrieval\n\
         - MEMORY_GAIN: Store new information as important\n\
         - MEMORY_LOSS: Remove/forget information\n\
         - COMMAND: System command or action request\n\
         - CLARIFICATION: Asking for clarification\n\
         - OPINION: Seeking opinion/evaluation\n\
         - CONTINUITY: Continue previous conversation\n\
         - FEEDBACK: Providing feedback\n\
         - UNKNOWN: Intent not recognized\n\n\
         For each potential intent, assign a confidence score between 0 and 1.\n\
         Format your response as:\n\
         INTENT: intent_name, confidence_score\n\n\
         You may include up to 3 intents, ordered by confidence.\n",
    );

    prompt
}

/// Parses `INTENT: name, confidence` lines from the model response.
///
/// Lines that do not match the format, name an unknown intent, or carry
/// an unparseable confidence are dropped silently. Confidence is capped
/// at 1.0.
fn parse_model_response(response: &str) -> BTreeMap<Intent, f64> {
    let mut scores = BTreeMap::new();

    for line in response.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix("INTENT:") else {
            continue;
        };

        let mut parts = rest.splitn(2, ',');
        let (Some(name), Some(confidence)) = (parts.next(), parts.next()) else {
            continue;
        };

        let Ok(intent) = Intent::from_str(&name.trim().to_uppercase()) else {
            continue;
        };
        let Ok(confidence) = confidence.trim().parse::<f64>() else {
            continue;
        };

        scores.insert(intent, confidence.min(1.0));
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mnemo_core::traits::adapter::PluginAdapter;
    use mnemo_core::traits::GenerationStream;
    use mnemo_core::types::{AdapterType, HealthStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted generation backend: always returns the same response and
    /// counts how often it was called.
    struct ScriptedGenerator {
        response: String,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PluginAdapter for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Provider
        }
        async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl GenerationAdapter for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, MnemoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.response.clone())
        }

        async fn generate_stream(&self, _prompt: &str) -> Result<GenerationStream, MnemoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Box::pin(futures::stream::iter(vec![Ok(self.response.clone())])))
        }
    }

    fn recognizer(response: &str) -> (IntentRecognizer, Arc<ScriptedGenerator>) {
        let provider = Arc::new(ScriptedGenerator::new(response));
        (IntentRecognizer::new(provider.clone()), provider)
    }

    #[test]
    fn parse_valid_intent_lines() {
        let response = "INTENT: MEMORY_GAIN, 0.8\nINTENT: GREETING, 0.3\n";
        let scores = parse_model_response(response);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&Intent::MemoryGain], 0.8);
        assert_eq!(scores[&Intent::Greeting], 0.3);
    }

    #[test]
    fn parse_accepts_lowercase_names_and_caps_confidence() {
        let scores = parse_model_response("INTENT: retrieval, 1.7");
        assert_eq!(scores[&Intent::Retrieval], 1.0);
    }

    #[test]
    fn parse_drops_malformed_lines() {
        let response = "\
Here is my analysis.
INTENT: MEMORY_LOSS, 0.9
INTENT: TELEPATHY, 0.5
INTENT: QUESTION, not-a-number
INTENT: COMMAND
random trailing text";
        let scores = parse_model_response(response);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[&Intent::MemoryLoss], 0.9);
    }

    #[test]
    fn parse_empty_response_is_empty() {
        assert!(parse_model_response("").is_empty());
        assert!(parse_model_response("no intents here").is_empty());
    }

    #[test]
    fn prompt_includes_last_three_turns_only() {
        let history = vec![
            ChatTurn::user("first"),
            ChatTurn::assistant("second"),
            ChatTurn::user("third"),
            ChatTurn::assistant("fourth"),
        ];
        let prompt = build_model_prompt("what now", &history, &BTreeMap::new());
        assert!(!prompt.contains("first"));
        assert!(prompt.contains("Assistant: second"));
        assert!(prompt.contains("User: third"));
        assert!(prompt.contains("Assistant: fourth"));
    }

    #[test]
    fn prompt_surfaces_high_confidence_hints_only() {
        let mut pattern = BTreeMap::new();
        pattern.insert(Intent::Retrieval, 0.75);
        pattern.insert(Intent::Question, 0.25);
        let prompt = build_model_prompt("tell me about the launch", &[], &pattern);
        assert!(prompt.contains("RETRIEVAL (confidence: 0.75)"));
        assert!(!prompt.contains("QUESTION (confidence"));
    }

    #[tokio::test]
    async fn memory_gain_message_involves_memory_gain() {
        // Model stage mocked to return nothing: the decision rests on the
        // pattern and keyword stages alone.
        let (recognizer, _) = recognizer("");
        let result = recognizer
            .recognize("remember this, it's important", &[])
            .await
            .unwrap();
        assert!(result.involves(Intent::MemoryGain));
    }

    #[tokio::test]
    async fn unmatched_message_is_unknown_with_full_confidence() {
        let (recognizer, _) = recognizer("");
        let result = recognizer.recognize("zzz", &[]).await.unwrap();
        assert_eq!(result.primary_intent, Intent::Unknown);
        assert!((result.confidence - 1.0).abs() < 1e-9);
        assert!(result.secondary_intents.is_empty());
    }

    #[tokio::test]
    async fn model_stage_runs_for_long_messages() {
        let (recognizer, provider) = recognizer("INTENT: OPINION, 0.9");
        let result = recognizer
            .recognize("what do you think of the new storage layout we discussed", &[])
            .await
            .unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(result.confidence_breakdown.contains_key(&Intent::Opinion));
    }

    #[tokio::test]
    async fn model_stage_skipped_for_short_resolved_messages() {
        // 13 chars, two pattern intents (RETRIEVAL via find..about,
        // QUESTION via the trailing question mark).
        let (recognizer, provider) = recognizer("INTENT: FEEDBACK, 0.9");
        let result = recognizer.recognize("find about x?", &[]).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(!result.confidence_breakdown.contains_key(&Intent::Feedback));
    }

    #[tokio::test]
    async fn greeting_with_reminder_keeps_greeting() {
        let (recognizer, _) = recognizer("INTENT: RETRIEVAL, 0.8\nINTENT: GREETING, 0.4");
        let result = recognizer
            .recognize("hi, also remind me what I wrote about the audit", &[])
            .await
            .unwrap();
        assert!(result.involves(Intent::Greeting));
        assert!(result.involves(Intent::Retrieval));
    }

    #[tokio::test]
    async fn deterministic_for_identical_inputs() {
        let (recognizer, _) = recognizer("INTENT: QUESTION, 0.6");
        let a = recognizer
            .recognize("how did the migration go?", &[])
            .await
            .unwrap();
        let b = recognizer
            .recognize("how did the migration go?", &[])
            .await
            .unwrap();
        assert_eq!(a.primary_intent, b.primary_intent);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.secondary_intents, b.secondary_intents);
        assert_eq!(a.confidence_breakdown, b.confidence_breakdown);
    }
}
