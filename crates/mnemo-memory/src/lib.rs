// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory subsystem for mnemo.
//!
//! Provides local ONNX embedding inference, a SQLite-backed vector store,
//! and the recency-biased memory engine that owns log entries.
//!
//! ## Architecture
//!
//! - **OnnxEmbedder**: local all-MiniLM-L6-v2 inference (384-dim vectors)
//! - **ModelManager**: first-run model download from HuggingFace
//! - **VectorStore**: SQLite persistence with BLOB vectors, brute-force
//!   cosine nearest-neighbor queries
//! - **MemoryEngine**: entry lifecycle plus decay-weighted search

pub mod embedder;
pub mod engine;
pub mod model_manager;
pub mod store;
pub mod types;

pub use embedder::{OnnxEmbedder, EMBEDDING_DIM};
pub use engine::MemoryEngine;
pub use model_manager::ModelManager;
pub use store::VectorStore;
pub use types::{LogEntry, SearchResult, VectorRecord};
