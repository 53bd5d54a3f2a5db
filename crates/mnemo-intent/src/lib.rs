// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent recognition for the mnemo conversation layer.
//!
//! Classifies a user message into a primary intent, secondary intents,
//! and extracted entities by fusing three independent signal sources:
//!
//! - **Pattern stage**: fixed regex rules per intent
//! - **Keyword stage**: fixed vocabulary counts per intent
//! - **Model stage**: a text-generation backend asked for
//!   `INTENT: name, confidence` lines (conditionally invoked)
//!
//! Fusion applies fixed linear weights (0.3 / 0.2 / 0.5) followed by
//! sum-normalization; see [`fusion::fuse`].

pub mod entities;
pub mod fusion;
pub mod patterns;
pub mod recognizer;
pub mod types;

pub use entities::extract_entities;
pub use fusion::{fuse, FusedIntents};
pub use recognizer::IntentRecognizer;
pub use types::{Entity, EntityKind, Intent, IntentResult};
