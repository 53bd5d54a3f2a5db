// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local ONNX embedding adapter (all-MiniLM-L6-v2).
//!
//! Runs sentence-transformer inference on CPU with no external API calls.
//! Output vectors are attention-mask mean-pooled and L2-normalized, so
//! cosine similarity reduces to a dot product downstream.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use mnemo_core::error::MnemoError;
use mnemo_core::traits::adapter::PluginAdapter;
use mnemo_core::traits::EmbeddingAdapter;
use mnemo_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};

/// Embedding dimensions for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Tokenized input ready for the ONNX graph.
struct EncodedText {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

/// ONNX-based text encoder.
///
/// Deterministic for a given model version. Accepts the empty string:
/// the tokenizer still emits its special tokens, so every input yields a
/// valid vector.
pub struct OnnxEmbedder {
    /// ONNX Runtime session (not Send, wrapped in Mutex for safety).
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

// Safety: the session is only touched while holding the Mutex, and the
// tokenizer is thread-safe for encoding.
unsafe impl Send for OnnxEmbedder {}
unsafe impl Sync for OnnxEmbedder {}

impl OnnxEmbedder {
    /// Loads the model and its tokenizer.
    ///
    /// `model_path` points at `model.onnx`; `tokenizer.json` is expected
    /// next to it.
    pub fn new(model_path: &Path) -> Result<Self, MnemoError> {
        let model_dir = model_path
            .parent()
            .ok_or_else(|| MnemoError::Internal("invalid model path".to_string()))?;

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            MnemoError::Internal(format!(
                "failed to load tokenizer from {}: {e}",
                tokenizer_path.display()
            ))
        })?;

        let session = Session::builder()
            .map_err(ort_err("create session builder"))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort_err("set optimization level"))?
            .with_intra_threads(1)
            .map_err(ort_err("set thread count"))?
            .commit_from_file(model_path)
            .map_err(|e| {
                MnemoError::Internal(format!(
                    "failed to load ONNX model from {}: {e}",
                    model_path.display()
                ))
            })?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    fn encode(&self, text: &str) -> Result<EncodedText, MnemoError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| MnemoError::Internal(format!("tokenization failed: {e}")))?;

        Ok(EncodedText {
            input_ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
            attention_mask: encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect(),
            token_type_ids: encoding.get_type_ids().iter().map(|&t| t as i64).collect(),
        })
    }

    /// Embed a single text, returning a normalized 384-dim vector.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, MnemoError> {
        let encoded = self.encode(text)?;
        let seq_len = encoded.input_ids.len();

        let input_ids = to_batch_tensor(encoded.input_ids, seq_len)?;
        let attention_mask = to_batch_tensor(encoded.attention_mask.clone(), seq_len)?;
        let token_type_ids = to_batch_tensor(encoded.token_type_ids, seq_len)?;

        let input_ids_tensor =
            TensorRef::from_array_view(&input_ids).map_err(ort_err("build input_ids tensor"))?;
        let attention_mask_tensor = TensorRef::from_array_view(&attention_mask)
            .map_err(ort_err("build attention_mask tensor"))?;
        let token_type_ids_tensor = TensorRef::from_array_view(&token_type_ids)
            .map_err(ort_err("build token_type_ids tensor"))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| MnemoError::Internal(format!("ONNX session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])
            .map_err(ort_err("run inference"))?;

        // Output shape is [1, seq_len, hidden].
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(ort_err("extract output tensor"))?;
        let hidden = shape[shape.len() - 1] as usize;

        let pooled = mean_pool(data, &encoded.attention_mask, seq_len, hidden);
        Ok(l2_normalize(&pooled))
    }
}

fn ort_err<E: std::fmt::Display>(what: &'static str) -> impl FnOnce(E) -> MnemoError {
    move |e| MnemoError::Internal(format!("ONNX {what} failed: {e}"))
}

fn to_batch_tensor(values: Vec<i64>, seq_len: usize) -> Result<Array2<i64>, MnemoError> {
    Array2::from_shape_vec((1, seq_len), values)
        .map_err(|e| MnemoError::Internal(format!("failed to shape input tensor: {e}")))
}

/// Attention-masked mean pooling over token embeddings.
fn mean_pool(embeddings: &[f32], attention_mask: &[i64], seq_len: usize, hidden: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden];
    let mut count = 0.0f32;

    for i in 0..seq_len {
        if attention_mask[i] > 0 {
            for j in 0..hidden {
                sum[j] += embeddings[i * hidden + j];
            }
            count += 1.0;
        }
    }

    if count > 0.0 {
        for val in &mut sum {
            *val /= count;
        }
    }

    sum
}

/// L2-normalize a vector; zero vectors pass through unchanged.
fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vec.iter().map(|v| v / norm).collect()
    } else {
        vec.to_vec()
    }
}

#[async_trait]
impl PluginAdapter for OnnxEmbedder {
    fn name(&self) -> &str {
        "onnx-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, MnemoError> {
        match self.session.lock() {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("session lock poisoned: {e}"))),
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for OnnxEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, MnemoError> {
        let mut embeddings = Vec::with_capacity(input.texts.len());
        for text in &input.texts {
            embeddings.push(self.embed_text(text)?);
        }

        Ok(EmbeddingOutput {
            embeddings,
            dimensions: EMBEDDING_DIM,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_scales_to_unit_length() {
        let n = l2_normalize(&[3.0, 4.0]);
        assert!((n[0] - 0.6).abs() < 0.001);
        assert!((n[1] - 0.8).abs() < 0.001);
        let norm: f32 = n.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[test]
    fn l2_normalize_zero_vector_unchanged() {
        assert_eq!(l2_normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn mean_pool_ignores_masked_tokens() {
        // 2 tokens, hidden=3, token 0 is padding.
        let embeddings = vec![
            9.0, 9.0, 9.0, // masked out
            1.0, 2.0, 3.0,
        ];
        let result = mean_pool(&embeddings, &[0, 1], 2, 3);
        assert_eq!(result, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn mean_pool_averages_unmasked_tokens() {
        let embeddings = vec![
            1.0, 2.0, //
            3.0, 4.0, //
            5.0, 6.0,
        ];
        let result = mean_pool(&embeddings, &[1, 1, 1], 3, 2);
        assert!((result[0] - 3.0).abs() < f32::EPSILON);
        assert!((result[1] - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn mean_pool_all_masked_is_zero() {
        let embeddings = vec![1.0, 2.0, 3.0, 4.0];
        let result = mean_pool(&embeddings, &[0, 0], 2, 2);
        assert_eq!(result, vec![0.0, 0.0]);
    }

    // OnnxEmbedder::new needs real model files on disk, so inference is
    // exercised by the integration path (doctor / first chat), not here.
}
