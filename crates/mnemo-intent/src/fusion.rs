// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confidence fusion: folds the three signal stages into one decision.
//!
//! A pure function over three score maps. Fixed linear weights, followed
//! by sum-normalization so the scores of all candidate intents add up to
//! 1.0 (normalization is skipped when every score is zero).

use std::collections::{BTreeMap, BTreeSet};

use crate::types::Intent;

/// Weight of the pattern stage in the combined score.
pub const PATTERN_WEIGHT: f64 = 0.3;
/// Weight of the keyword stage in the combined score.
pub const KEYWORD_WEIGHT: f64 = 0.2;
/// Weight of the model stage in the combined score.
pub const MODEL_WEIGHT: f64 = 0.5;

/// Normalized score above which a non-primary intent becomes secondary.
const SECONDARY_THRESHOLD: f64 = 0.2;
/// Score above which GREETING is forced into the secondaries.
const GREETING_THRESHOLD: f64 = 0.15;
/// Score above which an intent appears in the confidence breakdown.
const BREAKDOWN_THRESHOLD: f64 = 0.1;

/// The fused decision: a primary intent, substantial secondaries, and the
/// normalized score map.
#[derive(Debug, Clone)]
pub struct FusedIntents {
    pub primary: Intent,
    pub confidence: f64,
    pub secondary: BTreeSet<Intent>,
    /// Normalized scores above the breakdown threshold.
    pub breakdown: BTreeMap<Intent, f64>,
}

/// Combines the stage scores with fixed weights and normalizes.
///
/// A stage that produced no score for an intent contributes zero. The
/// special GREETING rule keeps a greeting alongside another primary
/// intent ("hi, also remind me of X") even when its share falls below
/// the regular secondary threshold.
pub fn fuse(
    pattern: &BTreeMap<Intent, f64>,
    keyword: &BTreeMap<Intent, f64>,
    model: Option<&BTreeMap<Intent, f64>>,
) -> FusedIntents {
    let mut combined: BTreeMap<Intent, f64> = BTreeMap::new();

    for (intent, confidence) in pattern {
        *combined.entry(*intent).or_insert(0.0) += confidence * PATTERN_WEIGHT;
    }
    for (intent, confidence) in keyword {
        *combined.entry(*intent).or_insert(0.0) += confidence * KEYWORD_WEIGHT;
    }
    if let Some(model) = model {
        for (intent, confidence) in model {
            *combined.entry(*intent).or_insert(0.0) += confidence * MODEL_WEIGHT;
        }
    }

    let total: f64 = combined.values().sum();
    if total > 0.0 {
        for score in combined.values_mut() {
            *score /= total;
        }
    }

    // Descending by score; the stable sort leaves ties in enum order.
    let mut ranked: Vec<(Intent, f64)> = combined.iter().map(|(i, s)| (*i, *s)).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let (primary, confidence) = ranked.first().copied().unwrap_or((Intent::Unknown, 0.0));

    let mut secondary: BTreeSet<Intent> = ranked
        .iter()
        .skip(1)
        .filter(|(_, score)| *score > SECONDARY_THRESHOLD)
        .map(|(intent, _)| *intent)
        .collect();

    if primary != Intent::Greeting
        && !secondary.contains(&Intent::Greeting)
        && combined.get(&Intent::Greeting).copied().unwrap_or(0.0) > GREETING_THRESHOLD
    {
        secondary.insert(Intent::Greeting);
    }

    let breakdown = combined
        .into_iter()
        .filter(|(_, score)| *score > BREAKDOWN_THRESHOLD)
        .collect();

    FusedIntents {
        primary,
        confidence,
        secondary,
        breakdown,
    }
}
