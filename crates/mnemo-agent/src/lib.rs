// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation orchestration for mnemo.
//!
//! Ties the intent recognizer, memory engine, and generation backend
//! together into a session loop, and provides insight report generation
//! plus per-entry analysis.
//!
//! ## Turn flow
//!
//! user message -> intent recognition -> behavior flags ->
//! {memory search | memory mutation} -> context assembly ->
//! generation backend -> response (+ memory-gain write-back)

pub mod analysis;
pub mod behavior;
pub mod context;
pub mod conversation;
pub mod insights;

pub use analysis::EntryAnalyzer;
pub use behavior::{derive_behaviors, BehaviorFlags};
pub use context::build_context;
pub use conversation::ConversationSession;
pub use insights::{InsightGenerator, InsightReport, InsightStore, InsightWindow};
