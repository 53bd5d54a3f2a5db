// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types for the memory engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dated log entry, the unit of memory.
///
/// Entries are created during ingestion or manual insertion; `id` is
/// assigned only once the entry is persisted. Once stored, an entry is
/// owned exclusively by the [`MemoryEngine`].
///
/// [`MemoryEngine`]: crate::engine::MemoryEngine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Store-assigned identifier; `None` until persisted.
    pub id: Option<String>,
    /// Calendar timestamp of the entry.
    pub date: DateTime<Utc>,
    /// Full entry text; the source of the embedding.
    pub raw_text: String,
    /// Optional model-generated summary.
    pub summary: Option<String>,
    /// Importance score in [0, 1].
    pub importance: f32,
}

impl LogEntry {
    /// Creates an unpersisted entry with default importance.
    pub fn new(date: DateTime<Utc>, raw_text: impl Into<String>) -> Self {
        Self {
            id: None,
            date,
            raw_text: raw_text.into(),
            summary: None,
            importance: 0.5,
        }
    }
}

/// A search hit with its similarity and recency-biased final score.
///
/// Ephemeral, produced per query, never persisted. `final_score` is
/// `similarity_score + recency_weight * recency`, and result lists are
/// always sorted by `final_score` descending.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub entry: LogEntry,
    pub similarity_score: f64,
    pub final_score: f64,
}

/// A raw record in a vector collection.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    /// Arbitrary JSON metadata; the memory engine stores `{"date": <ISO-8601>}`.
    pub metadata: serde_json::Value,
}

/// Convert an f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert a SQLite BLOB back to an f32 vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

/// Cosine distance between two vectors, in [0, 2].
///
/// Does not assume normalized inputs. A zero-norm vector is treated as
/// maximally dissimilar-but-neutral (distance 1.0).
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_entry_defaults() {
        let entry = LogEntry::new(Utc::now(), "worked on the parser");
        assert!(entry.id.is_none());
        assert!(entry.summary.is_none());
        assert_eq!(entry.importance, 0.5);
    }

    #[test]
    fn blob_roundtrip() {
        let original = vec![0.1_f32, 0.2, 0.3, -0.5, 1.0];
        let blob = vec_to_blob(&original);
        assert_eq!(blob.len(), original.len() * 4);
        let recovered = blob_to_vec(&blob);
        for (a, b) in original.iter().zip(recovered.iter()) {
            assert!((a - b).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn cosine_distance_identical() {
        let v = vec![0.3, 0.4, 0.5];
        assert!(cosine_distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn cosine_distance_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_distance_opposite_is_two() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_distance(&a, &b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_distance_zero_vector_is_neutral() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
    }
}
