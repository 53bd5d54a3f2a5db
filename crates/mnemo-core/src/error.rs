// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the mnemo memory engine.

use thiserror::Error;

/// The primary error type used across all mnemo crates.
#[derive(Debug, Error)]
pub enum MnemoError {
    /// Configuration errors (invalid TOML, missing required fields, type
    /// mismatches). Fatal at startup, never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure,
    /// serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generation backend errors (bad status, unparseable response body).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport-level failure reaching the generation backend. Kept
    /// separate from [`MnemoError::Provider`] so callers can tell
    /// "the model server is down" apart from "the model misbehaved".
    #[error("connection error: could not reach {url}")]
    Connection {
        url: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MnemoError {
    /// Returns true if this error indicates the generation backend is
    /// unreachable (as opposed to reachable but failing).
    pub fn is_connection(&self) -> bool {
        matches!(self, MnemoError::Connection { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_distinguishable() {
        let conn = MnemoError::Connection {
            url: "http://localhost:11434".into(),
            source: None,
        };
        let provider = MnemoError::Provider {
            message: "bad response".into(),
            source: None,
        };
        assert!(conn.is_connection());
        assert!(!provider.is_connection());
    }

    #[test]
    fn display_includes_context() {
        let err = MnemoError::Connection {
            url: "http://localhost:11434".into(),
            source: None,
        };
        assert!(err.to_string().contains("http://localhost:11434"));

        let err = MnemoError::Config("missing model name".into());
        assert!(err.to_string().contains("missing model name"));
    }
}
