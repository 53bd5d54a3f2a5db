// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed rule patterns and keyword vocabularies for the fast stages.
//!
//! Patterns match against the lowercased, trimmed message. Each matching
//! rule adds 0.25 confidence to its intent, capped at 0.9; a message that
//! matches nothing scores UNKNOWN at 0.3. Keyword confidence scales with
//! the match count: `0.3 + 0.1 * n`, capped at 0.8.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::Intent;

/// Confidence added per matching rule.
const PATTERN_STEP: f64 = 0.25;
/// Pattern-stage confidence cap.
const PATTERN_CAP: f64 = 0.9;
/// Fallback confidence for UNKNOWN when no rule matches.
const UNKNOWN_FALLBACK: f64 = 0.3;

/// Keyword-stage base confidence.
const KEYWORD_BASE: f64 = 0.3;
/// Confidence added per keyword match.
const KEYWORD_STEP: f64 = 0.1;
/// Keyword-stage confidence cap.
const KEYWORD_CAP: f64 = 0.8;

static PATTERN_RULES: LazyLock<Vec<(Intent, Vec<Regex>)>> = LazyLock::new(|| {
    let compile = |rules: &[&str]| -> Vec<Regex> {
        rules
            .iter()
            .map(|r| Regex::new(r).expect("pattern table regex must compile"))
            .collect()
    };

    vec![
        (
            Intent::Greeting,
            compile(&[
                r"^(hey|hi|hello|greetings|yo|howdy|what's up|sup)",
                r"^(good|happy) (morning|afternoon|evening|day)",
            ]),
        ),
        (
            Intent::Question,
            compile(&[
                r"\?$",
                r"^(what|when|where|who|whom|whose|which|why|how)",
                r"^(can|could|would|should|is|are|am|was|were|do|does|did) ",
            ]),
        ),
        (
            Intent::Retrieval,
            compile(&[
                r"(tell|show|find|search|look|get).*(about|for)",
                r"(what|when).*(happened|occurred|took place)",
                r"(remember|recall|retrieve)",
                r"(find|search|look).*(information|data)",
            ]),
        ),
        (
            Intent::MemoryGain,
            compile(&[
                r"(important|remember|note|save|keep|store)",
                r"(this|that).*(matters|is important|is significant)",
                r"(don't forget|make sure|be sure)",
                r"(take note|write|jot|log)",
            ]),
        ),
        (
            Intent::MemoryLoss,
            compile(&[
                r"(forget|ignore|disregard|remove|delete)",
                r"(not important|doesn't matter|irrelevant)",
                r"(don't|do not).*(care|need|want)",
                r"(stop|quit).*(thinking|talking)",
            ]),
        ),
        (
            Intent::Command,
            compile(&[
                r"^(do|please|can you|could you)",
                r"^(list|show|find|get|create|make|update|change|modify|delete)",
                r"(run|execute|perform|implement)",
            ]),
        ),
    ]
});

const KEYWORD_TABLE: &[(Intent, &[&str])] = &[
    (
        Intent::Retrieval,
        &[
            "information",
            "details",
            "specifics",
            "data",
            "knowledge",
            "learn",
            "remember",
            "recall",
            "lookup",
            "check",
            "find out",
        ],
    ),
    (
        Intent::MemoryGain,
        &[
            "important",
            "significant",
            "crucial",
            "essential",
            "key",
            "remember",
            "note",
            "save",
            "keep track",
            "don't forget",
            "highlight",
            "mark",
            "flag",
            "store",
            "archive",
            "preserve",
        ],
    ),
    (
        Intent::MemoryLoss,
        &[
            "forget",
            "ignore",
            "disregard",
            "unimportant",
            "irrelevant",
            "useless",
            "pointless",
            "meaningless",
            "trivial",
            "delete",
            "remove",
            "erase",
            "discard",
            "trash",
            "dump",
            "clear",
        ],
    ),
];

/// Pattern stage: regex rules over the lowercased message.
pub fn pattern_scores(message: &str) -> BTreeMap<Intent, f64> {
    let cleaned = message.to_lowercase();
    let cleaned = cleaned.trim();

    let mut scores = BTreeMap::new();
    for (intent, rules) in PATTERN_RULES.iter() {
        for rule in rules {
            if rule.is_match(cleaned) {
                let score = scores.entry(*intent).or_insert(0.0);
                *score = (*score + PATTERN_STEP).min(PATTERN_CAP);
            }
        }
    }

    if scores.is_empty() {
        scores.insert(Intent::Unknown, UNKNOWN_FALLBACK);
    }

    scores
}

/// Keyword stage: substring vocabulary counts over the lowercased
/// message. Intents with zero matches are omitted.
pub fn keyword_scores(message: &str) -> BTreeMap<Intent, f64> {
    let lower = message.to_lowercase();

    let mut scores = BTreeMap::new();
    for (intent, keywords) in KEYWORD_TABLE {
        let matches = keywords.iter().filter(|k| lower.contains(*k)).count();
        if matches > 0 {
            let confidence = (KEYWORD_BASE + KEYWORD_STEP * matches as f64).min(KEYWORD_CAP);
            scores.insert(*intent, confidence);
        }
    }

    scores
}
