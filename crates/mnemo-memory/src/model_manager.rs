// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-run download of the ONNX embedding model.
//!
//! Fetches the quantized all-MiniLM-L6-v2 model and its tokenizer from
//! HuggingFace into the data directory; later runs find them on disk.

use std::path::{Path, PathBuf};

use mnemo_core::error::MnemoError;
use tracing::info;

const MODEL_URL: &str =
    "https://huggingface.co/onnx-community/all-MiniLM-L6-v2-ONNX/resolve/main/onnx/model_quantized.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

/// Resolves and, when missing, downloads the embedding model files.
pub struct ModelManager {
    data_dir: PathBuf,
}

impl ModelManager {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Directory holding the model files.
    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join("models").join("all-MiniLM-L6-v2")
    }

    /// Path to the ONNX model file.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir().join("model.onnx")
    }

    /// Path to the tokenizer.json file.
    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir().join("tokenizer.json")
    }

    /// True when both model and tokenizer are on disk.
    pub fn is_model_available(&self) -> bool {
        self.model_path().exists() && self.tokenizer_path().exists()
    }

    /// Ensures the model files exist, downloading any that are missing.
    ///
    /// Returns the model path. Partial downloads are removed on failure so
    /// a later run retries cleanly.
    pub async fn ensure_model(&self) -> Result<PathBuf, MnemoError> {
        if self.is_model_available() {
            return Ok(self.model_path());
        }

        info!("embedding model not found, downloading from HuggingFace");

        let model_dir = self.model_dir();
        tokio::fs::create_dir_all(&model_dir)
            .await
            .map_err(|e| MnemoError::Internal(format!("failed to create model directory: {e}")))?;

        for (filename, url) in [("model.onnx", MODEL_URL), ("tokenizer.json", TOKENIZER_URL)] {
            let dest = model_dir.join(filename);
            if dest.exists() {
                continue;
            }

            match download_file(url, &dest).await {
                Ok(size) => info!(filename, size, "downloaded model file"),
                Err(e) => {
                    let _ = tokio::fs::remove_file(&dest).await;
                    return Err(e);
                }
            }
        }

        info!(dir = %model_dir.display(), "embedding model ready");
        Ok(self.model_path())
    }
}

async fn download_file(url: &str, dest: &Path) -> Result<usize, MnemoError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| MnemoError::Internal(format!("failed to download {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(MnemoError::Internal(format!(
            "download of {url} failed with status {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MnemoError::Internal(format!("failed to read body from {url}: {e}")))?;

    let size = bytes.len();
    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|e| MnemoError::Internal(format!("failed to write {}: {e}", dest.display())))?;

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_rooted_in_data_dir() {
        let mgr = ModelManager::new(PathBuf::from("/data/mnemo"));
        assert_eq!(
            mgr.model_path(),
            PathBuf::from("/data/mnemo/models/all-MiniLM-L6-v2/model.onnx")
        );
        assert_eq!(
            mgr.tokenizer_path(),
            PathBuf::from("/data/mnemo/models/all-MiniLM-L6-v2/tokenizer.json")
        );
    }

    #[test]
    fn model_not_available_when_missing() {
        let mgr = ModelManager::new(PathBuf::from("/nonexistent/mnemo"));
        assert!(!mgr.is_model_available());
    }
}
