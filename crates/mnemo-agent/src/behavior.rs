// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps recognized intents to the behavior flags a turn acts on.

use mnemo_intent::{EntityKind, Intent, IntentResult};

/// Importance entities above this confidence trigger a memory write.
const IMPORTANCE_GAIN_THRESHOLD: f64 = 0.6;

/// Action directives derived from an [`IntentResult`].
///
/// Every turn starts from the default (all flags off); flags only turn
/// on, never off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BehaviorFlags {
    /// Search memory and ground the response on the results.
    pub retrieval: bool,
    /// Write this exchange back to memory after responding.
    pub memory_gain: bool,
    /// Degrade the entries most relevant to the message.
    pub memory_loss: bool,
}

/// Derives the behavior flags for one recognized message.
///
/// The primary intent QUESTION implies retrieval; as a secondary intent
/// it does not.
pub fn derive_behaviors(result: &IntentResult) -> BehaviorFlags {
    let mut flags = BehaviorFlags::default();

    match result.primary_intent {
        Intent::Retrieval | Intent::Question => flags.retrieval = true,
        Intent::MemoryGain => flags.memory_gain = true,
        Intent::MemoryLoss => flags.memory_loss = true,
        _ => {}
    }

    for intent in &result.secondary_intents {
        match intent {
            Intent::Retrieval => flags.retrieval = true,
            Intent::MemoryGain => flags.memory_gain = true,
            Intent::MemoryLoss => flags.memory_loss = true,
            _ => {}
        }
    }

    for entity in &result.entities {
        if entity.kind == EntityKind::Importance && entity.confidence > IMPORTANCE_GAIN_THRESHOLD {
            flags.memory_gain = true;
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_intent::Entity;
    use std::collections::{BTreeMap, BTreeSet};

    fn result(primary: Intent, secondary: &[Intent], entities: Vec<Entity>) -> IntentResult {
        IntentResult {
            primary_intent: primary,
            secondary_intents: secondary.iter().copied().collect::<BTreeSet<_>>(),
            entities,
            confidence: 0.5,
            confidence_breakdown: BTreeMap::new(),
        }
    }

    #[test]
    fn question_primary_implies_retrieval() {
        let flags = derive_behaviors(&result(Intent::Question, &[], vec![]));
        assert!(flags.retrieval);
        assert!(!flags.memory_gain);
        assert!(!flags.memory_loss);
    }

    #[test]
    fn question_secondary_does_not_imply_retrieval() {
        let flags = derive_behaviors(&result(Intent::Greeting, &[Intent::Question], vec![]));
        assert!(!flags.retrieval);
    }

    #[test]
    fn memory_intents_map_to_flags() {
        assert!(derive_behaviors(&result(Intent::MemoryGain, &[], vec![])).memory_gain);
        assert!(derive_behaviors(&result(Intent::MemoryLoss, &[], vec![])).memory_loss);
        assert!(derive_behaviors(&result(Intent::Retrieval, &[], vec![])).retrieval);
    }

    #[test]
    fn secondary_memory_intents_add_flags() {
        let flags = derive_behaviors(&result(
            Intent::Greeting,
            &[Intent::Retrieval, Intent::MemoryLoss],
            vec![],
        ));
        assert!(flags.retrieval);
        assert!(flags.memory_loss);
        assert!(!flags.memory_gain);
    }

    #[test]
    fn confident_importance_entity_triggers_memory_gain() {
        let entity = Entity {
            kind: EntityKind::Importance,
            value: "critical".into(),
            confidence: 0.7,
            start_pos: 0,
            end_pos: 8,
        };
        let flags = derive_behaviors(&result(Intent::Greeting, &[], vec![entity]));
        assert!(flags.memory_gain);
    }

    #[test]
    fn weak_importance_entity_is_ignored() {
        let entity = Entity {
            kind: EntityKind::Importance,
            value: "key".into(),
            confidence: 0.5,
            start_pos: 0,
            end_pos: 3,
        };
        let flags = derive_behaviors(&result(Intent::Greeting, &[], vec![entity]));
        assert!(!flags.memory_gain);
    }

    #[test]
    fn plain_greeting_has_no_flags() {
        let flags = derive_behaviors(&result(Intent::Greeting, &[], vec![]));
        assert_eq!(flags, BehaviorFlags::default());
    }
}
