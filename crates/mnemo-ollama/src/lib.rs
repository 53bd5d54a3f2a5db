// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama generation backend adapter for mnemo.
//!
//! Implements [`mnemo_core::GenerationAdapter`] against a local Ollama
//! server: blocking completion via `POST /api/generate` and streaming
//! completion via the same endpoint's NDJSON response.

pub mod client;
pub mod types;

pub use client::OllamaClient;
