// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent and entity taxonomies plus the recognition result record.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The communicative purpose of a user message. Closed enumeration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// General greeting or small talk.
    Greeting,
    /// General information seeking.
    Question,
    /// Specific memory/knowledge retrieval.
    Retrieval,
    /// Store new information.
    MemoryGain,
    /// Remove/forget information.
    MemoryLoss,
    /// System command or action request.
    Command,
    /// Asking for clarification.
    Clarification,
    /// Seeking opinion/evaluation.
    Opinion,
    /// Continue previous conversation.
    Continuity,
    /// Providing feedback.
    Feedback,
    /// Intent not recognized.
    Unknown,
}

/// Kinds of entities extracted from a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Date,
    Topic,
    Keyword,
    Person,
    Project,
    Action,
    Sentiment,
    Importance,
}

/// An entity extracted from a message. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub value: String,
    /// Extraction confidence in [0, 1].
    pub confidence: f64,
    /// Character offset of the match start in the source message.
    pub start_pos: usize,
    /// Character offset one past the match end.
    pub end_pos: usize,
}

/// The outcome of intent recognition for one message.
///
/// Invariants: `secondary_intents` never contains `primary_intent`, and
/// `confidence` equals the primary intent's post-normalization combined
/// score.
#[derive(Debug, Clone)]
pub struct IntentResult {
    pub primary_intent: Intent,
    pub secondary_intents: BTreeSet<Intent>,
    pub entities: Vec<Entity>,
    pub confidence: f64,
    /// Post-normalization combined score per intent, for every intent
    /// scoring above 0.1. Diagnostic output.
    pub confidence_breakdown: BTreeMap<Intent, f64>,
}

impl IntentResult {
    /// True when `intent` is the primary or one of the secondaries.
    pub fn involves(&self, intent: Intent) -> bool {
        self.primary_intent == intent || self.secondary_intents.contains(&intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn intent_names_use_screaming_snake_case() {
        assert_eq!(Intent::MemoryGain.to_string(), "MEMORY_GAIN");
        assert_eq!(Intent::MemoryLoss.to_string(), "MEMORY_LOSS");
        assert_eq!(Intent::Unknown.to_string(), "UNKNOWN");
        assert_eq!(Intent::from_str("MEMORY_GAIN").unwrap(), Intent::MemoryGain);
        assert_eq!(Intent::from_str("GREETING").unwrap(), Intent::Greeting);
    }

    #[test]
    fn unknown_intent_name_fails_to_parse() {
        assert!(Intent::from_str("TELEPATHY").is_err());
    }

    #[test]
    fn entity_kind_names() {
        assert_eq!(EntityKind::Importance.to_string(), "IMPORTANCE");
        assert_eq!(EntityKind::Date.to_string(), "DATE");
    }

    #[test]
    fn involves_checks_primary_and_secondary() {
        let result = IntentResult {
            primary_intent: Intent::Question,
            secondary_intents: [Intent::Greeting].into_iter().collect(),
            entities: vec![],
            confidence: 0.6,
            confidence_breakdown: BTreeMap::new(),
        };
        assert!(result.involves(Intent::Question));
        assert!(result.involves(Intent::Greeting));
        assert!(!result.involves(Intent::MemoryLoss));
    }
}
