// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Ollama generate API.
//!
//! Provides [`OllamaClient`] implementing [`GenerationAdapter`]: blocking
//! single-shot completion and NDJSON streaming. No retries; a request
//! timeout bounds an unresponsive backend.

use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use mnemo_core::error::MnemoError;
use mnemo_core::traits::adapter::PluginAdapter;
use mnemo_core::traits::{GenerationAdapter, GenerationStream};
use mnemo_core::types::{AdapterType, HealthStatus};
use tracing::{debug, trace};

use crate::types::{GenerateRequest, GenerateResponse, StreamChunk, VersionResponse};

/// HTTP client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaClient {
    /// Creates a client for the server at `base_url` using `model`.
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, MnemoError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MnemoError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
        })
    }

    /// Returns the configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post_generate(
        &self,
        prompt: &str,
        stream: bool,
    ) -> Result<reqwest::Response, MnemoError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(status = %status, stream, "generate response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MnemoError::Provider {
                message: format!("Ollama returned {status}: {body}"),
                source: None,
            });
        }

        Ok(response)
    }

    fn transport_error(&self, e: reqwest::Error) -> MnemoError {
        if e.is_connect() {
            MnemoError::Connection {
                url: self.base_url.clone(),
                source: Some(Box::new(e)),
            }
        } else if e.is_timeout() {
            MnemoError::Timeout {
                duration: self.timeout,
            }
        } else {
            MnemoError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

/// Parses an NDJSON response body into a stream of text chunks.
///
/// Each complete line is deserialized as a [`StreamChunk`]; lines that
/// fail to decode are skipped rather than aborting the stream. The
/// stream ends when the backend closes the connection after its
/// `done: true` line.
fn parse_ndjson_stream(
    response: reqwest::Response,
) -> impl Stream<Item = Result<String, MnemoError>> {
    let byte_stream = response.bytes_stream();

    byte_stream
        .scan(String::new(), |buffer, result| {
            let items: Vec<Result<String, MnemoError>> = match result {
                Ok(bytes) => {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));
                    let mut chunks = Vec::new();
                    while let Some(newline) = buffer.find('\n') {
                        let line = buffer[..newline].trim().to_string();
                        buffer.drain(..=newline);
                        if line.is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<StreamChunk>(&line) {
                            Ok(chunk) => {
                                if !chunk.response.is_empty() {
                                    chunks.push(Ok(chunk.response));
                                }
                                if chunk.done {
                                    trace!("stream finished");
                                }
                            }
                            Err(e) => {
                                debug!(error = %e, "skipping undecodable stream line");
                            }
                        }
                    }
                    chunks
                }
                Err(e) => vec![Err(MnemoError::Provider {
                    message: format!("stream transport error: {e}"),
                    source: Some(Box::new(e)),
                })],
            };
            futures::future::ready(Some(futures::stream::iter(items)))
        })
        .flatten()
}

#[async_trait]
impl PluginAdapter for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        let result = self
            .client
            .get(format!("{}/api/version", self.base_url))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<VersionResponse>().await {
                    Ok(version) => {
                        debug!(version = version.version.as_str(), "ollama reachable");
                        Ok(HealthStatus::Healthy)
                    }
                    Err(e) => Ok(HealthStatus::Degraded(format!(
                        "version endpoint unreadable: {e}"
                    ))),
                }
            }
            Ok(response) => Ok(HealthStatus::Degraded(format!(
                "version endpoint returned {}",
                response.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "cannot reach {}: {e}",
                self.base_url
            ))),
        }
    }
}

#[async_trait]
impl GenerationAdapter for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, MnemoError> {
        let response = self.post_generate(prompt, false).await?;

        let body = response.text().await.map_err(|e| MnemoError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| MnemoError::Provider {
                message: format!("failed to parse generate response: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(parsed.response)
    }

    async fn generate_stream(&self, prompt: &str) -> Result<GenerationStream, MnemoError> {
        let response = self.post_generate(prompt, true).await?;
        Ok(Box::pin(parse_ndjson_stream(response)))
    }
}
