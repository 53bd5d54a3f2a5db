// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the mnemo memory engine.
//!
//! This crate provides the foundational trait definitions, error type, and
//! common types used throughout the mnemo workspace. Backend adapters
//! (embedding, generation) implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MnemoError;
pub use types::{AdapterType, ChatTurn, HealthStatus, Role};

pub use traits::{EmbeddingAdapter, GenerationAdapter, GenerationStream, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_constructible() {
        let _config = MnemoError::Config("test".into());
        let _storage = MnemoError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _provider = MnemoError::Provider {
            message: "test".into(),
            source: None,
        };
        let _connection = MnemoError::Connection {
            url: "http://localhost:11434".into(),
            source: None,
        };
        let _timeout = MnemoError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = MnemoError::Internal("test".into());
    }

    #[test]
    fn trait_modules_are_exported() {
        // Compile-time check that the adapter traits are reachable from
        // the crate root.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_generation_adapter<T: GenerationAdapter>() {}
    }
}
