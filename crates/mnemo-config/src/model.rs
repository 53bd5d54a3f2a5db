// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the mnemo memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level mnemo configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemoConfig {
    /// Assistant identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Ollama generation backend settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Memory store and ranking settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Insight report settings.
    #[serde(default)]
    pub insights: InsightsConfig,
}

/// Assistant identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name the assistant uses in prompts.
    #[serde(default = "default_persona_name")]
    pub persona_name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            persona_name: default_persona_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_persona_name() -> String {
    "ben".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Ollama generation backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier passed to the generate endpoint.
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds for generation calls.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.1".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

/// Memory store and ranking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Data directory for the store and embedding model files.
    /// `None` resolves to `~/.local/share/mnemo` at startup.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Name of the vector collection holding log entries.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Exponential recency decay rate, per day of entry age.
    #[serde(default = "default_lambda_decay")]
    pub lambda_decay: f64,

    /// Weight of the recency score in the final ranking score.
    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,

    /// Default number of results returned by a search.
    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            collection: default_collection(),
            lambda_decay: default_lambda_decay(),
            recency_weight: default_recency_weight(),
            search_top_k: default_search_top_k(),
        }
    }
}

fn default_collection() -> String {
    "log_entries".to_string()
}

fn default_lambda_decay() -> f64 {
    0.1
}

fn default_recency_weight() -> f64 {
    0.2
}

fn default_search_top_k() -> usize {
    5
}

/// Insight report configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InsightsConfig {
    /// Number of most recent entries analyzed per insight run.
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,

    /// Number of entries per analysis window.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            recent_count: default_recent_count(),
            window_size: default_window_size(),
        }
    }
}

fn default_recent_count() -> usize {
    20
}

fn default_window_size() -> usize {
    7
}
