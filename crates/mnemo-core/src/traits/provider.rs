// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation adapter trait for text-generation backends.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::MnemoError;
use crate::traits::adapter::PluginAdapter;

/// A lazy, finite, non-restartable sequence of response text chunks.
///
/// Chunk boundaries carry no meaning (a chunk may split a word). Callers
/// either pull chunks directly or drive a push-style callback while
/// accumulating the full response.
pub type GenerationStream = Pin<Box<dyn Stream<Item = Result<String, MnemoError>> + Send>>;

/// Adapter for text-generation backends.
///
/// The backend is treated as a black-box completion service with a
/// blocking single-shot mode and a streaming mode. Transport-level
/// failures surface as [`MnemoError::Connection`] so callers can
/// distinguish an unreachable backend from a misbehaving one.
///
/// [`MnemoError::Connection`]: crate::error::MnemoError::Connection
#[async_trait]
pub trait GenerationAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response text.
    async fn generate(&self, prompt: &str) -> Result<String, MnemoError>;

    /// Sends a completion request and returns a stream of response chunks.
    async fn generate_stream(&self, prompt: &str) -> Result<GenerationStream, MnemoError>;
}
