// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait implemented by every pluggable backend.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for mnemo backend adapters.
///
/// Every adapter (generation provider, embedder) implements this trait,
/// which provides identity and health check capabilities used by the
/// `doctor` command and startup diagnostics.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the type of adapter (provider, embedding, storage).
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, MnemoError>;
}
