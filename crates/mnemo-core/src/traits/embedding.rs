// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{EmbeddingInput, EmbeddingOutput};

/// Adapter for generating fixed-dimension vector embeddings from text.
///
/// Implementations must be deterministic for a given model version, must
/// have no side effects, and must accept the empty string (returning a
/// valid vector rather than an error). The memory engine depends only on
/// this trait, so tests can substitute a deterministic in-process encoder.
#[async_trait]
pub trait EmbeddingAdapter: PluginAdapter {
    /// Generates embeddings for the given input.
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MnemoError>;
}
