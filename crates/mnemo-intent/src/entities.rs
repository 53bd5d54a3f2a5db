// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule-based entity extraction, independent of the intent stages.
//!
//! Scans for date-like substrings, importance markers, and coarse
//! sentiment terms. Each extractor tags matches with a fixed confidence
//! and the character span of the match in the source message.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Entity, EntityKind};

const DATE_CONFIDENCE: f64 = 0.8;
const IMPORTANCE_CONFIDENCE: f64 = 0.7;
const SENTIMENT_CONFIDENCE: f64 = 0.6;

static DATE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // YYYY-MM-DD
        r"\b\d{4}-\d{2}-\d{2}\b",
        // M/D/Y
        r"\b\d{1,2}/\d{1,2}/\d{2,4}\b",
        // Month Day[, ]Year
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]* \d{1,2}(st|nd|rd|th)?,? \d{2,4}\b",
    ]
    .iter()
    .map(|r| Regex::new(r).expect("date regex must compile"))
    .collect()
});

static IMPORTANCE_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(important|critical|crucial|essential|key|significant|vital|major)\b",
        r"(?i)\b(high|top)(-|\s)priority\b",
    ]
    .iter()
    .map(|r| Regex::new(r).expect("importance regex must compile"))
    .collect()
});

static POSITIVE_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(good|great|excellent|amazing|wonderful|positive|love|like|enjoy|happy|glad)\b",
    )
    .expect("sentiment regex must compile")
});

static NEGATIVE_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(bad|terrible|awful|horrible|negative|hate|dislike|sad|upset|disappointed)\b",
    )
    .expect("sentiment regex must compile")
});

/// Extracts all date, importance, and sentiment entities from `message`,
/// in that scan order.
pub fn extract_entities(message: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    for rule in DATE_RULES.iter() {
        for m in rule.find_iter(message) {
            entities.push(entity_at(message, EntityKind::Date, m.as_str(), DATE_CONFIDENCE, m.range()));
        }
    }

    for rule in IMPORTANCE_RULES.iter() {
        for m in rule.find_iter(message) {
            entities.push(entity_at(
                message,
                EntityKind::Importance,
                m.as_str(),
                IMPORTANCE_CONFIDENCE,
                m.range(),
            ));
        }
    }

    for m in POSITIVE_TERMS.find_iter(message) {
        entities.push(entity_at(message, EntityKind::Sentiment, "positive", SENTIMENT_CONFIDENCE, m.range()));
    }

    for m in NEGATIVE_TERMS.find_iter(message) {
        entities.push(entity_at(message, EntityKind::Sentiment, "negative", SENTIMENT_CONFIDENCE, m.range()));
    }

    entities
}

/// Builds an entity, converting the regex byte range to character offsets.
fn entity_at(
    message: &str,
    kind: EntityKind,
    value: &str,
    confidence: f64,
    range: std::ops::Range<usize>,
) -> Entity {
    let start_pos = message[..range.start].chars().count();
    let end_pos = start_pos + message[range.start..range.end].chars().count();
    Entity {
        kind,
        value: value.to_string(),
        confidence,
        start_pos,
        end_pos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn of_kind(entities: &[Entity], kind: EntityKind) -> Vec<&Entity> {
        entities.iter().filter(|e| e.kind == kind).collect()
    }

    #[test]
    fn extracts_iso_date() {
        let entities = extract_entities("the standup on 2024-03-28 ran long");
        let dates = of_kind(&entities, EntityKind::Date);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].value, "2024-03-28");
        assert_eq!(dates[0].confidence, 0.8);
        assert_eq!(dates[0].start_pos, 15);
        assert_eq!(dates[0].end_pos, 25);
    }

    #[test]
    fn extracts_slash_date() {
        let entities = extract_entities("we shipped on 3/28/2024");
        let dates = of_kind(&entities, EntityKind::Date);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].value, "3/28/2024");
    }

    #[test]
    fn extracts_month_name_date() {
        let entities = extract_entities("kickoff was March 28, 2024 in the office");
        let dates = of_kind(&entities, EntityKind::Date);
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].value, "March 28, 2024");
    }

    #[test]
    fn extracts_importance_markers() {
        let entities = extract_entities("this is important, maybe even critical");
        let markers = of_kind(&entities, EntityKind::Importance);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].value, "important");
        assert_eq!(markers[0].confidence, 0.7);
        assert_eq!(markers[1].value, "critical");
    }

    #[test]
    fn extracts_priority_phrase() {
        let entities = extract_entities("mark it high priority");
        let markers = of_kind(&entities, EntityKind::Importance);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].value, "high priority");
    }

    #[test]
    fn sentiment_values_are_polarity_labels() {
        let entities = extract_entities("the demo was great but the retro was terrible");
        let sentiments = of_kind(&entities, EntityKind::Sentiment);
        assert_eq!(sentiments.len(), 2);
        assert_eq!(sentiments[0].value, "positive");
        assert_eq!(sentiments[0].confidence, 0.6);
        assert_eq!(sentiments[1].value, "negative");
    }

    #[test]
    fn spans_are_character_offsets() {
        // Multibyte char before the match shifts byte offsets but not
        // character offsets.
        let message = "café was great";
        let entities = extract_entities(message);
        let sentiments = of_kind(&entities, EntityKind::Sentiment);
        assert_eq!(sentiments.len(), 1);
        assert_eq!(sentiments[0].start_pos, 9);
        assert_eq!(sentiments[0].end_pos, 14);
        let chars: Vec<char> = message.chars().collect();
        let span: String = chars[sentiments[0].start_pos..sentiments[0].end_pos].iter().collect();
        assert_eq!(span, "great");
    }

    #[test]
    fn plain_message_yields_no_entities() {
        assert!(extract_entities("let's talk tomorrow").is_empty());
    }
}
