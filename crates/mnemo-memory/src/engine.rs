// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory engine: entry lifecycle plus recency-biased semantic search.
//!
//! Built on [`VectorStore`] and an [`EmbeddingAdapter`]. Search ranks by
//! `similarity + recency_weight * exp(-lambda_decay * age_days)`; the
//! recency term is intentionally unclamped, so a future-dated entry can
//! score above 1.0.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mnemo_core::error::MnemoError;
use mnemo_core::traits::EmbeddingAdapter;
use mnemo_core::types::EmbeddingInput;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::VectorStore;
use crate::types::{LogEntry, SearchResult, VectorRecord};

/// Default exponential decay rate per day of entry age.
pub const DEFAULT_LAMBDA_DECAY: f64 = 0.1;

/// Default weight of the recency score in the final ranking score.
pub const DEFAULT_RECENCY_WEIGHT: f64 = 0.2;

/// Exponential recency score for an entry `age_days` old.
///
/// `age_days` may be negative for future-dated entries; the result is
/// then greater than 1.0 (no clamping).
fn recency_score(lambda_decay: f64, age_days: i64) -> f64 {
    (-lambda_decay * age_days as f64).exp()
}

/// Stores, mutates, and searches dated log entries.
///
/// One engine per collection; callers must serialize access per process
/// or add external locking when sharing across threads.
pub struct MemoryEngine {
    store: VectorStore,
    embedder: Arc<dyn EmbeddingAdapter>,
    lambda_decay: f64,
    recency_weight: f64,
}

impl MemoryEngine {
    /// Creates an engine with the default ranking constants.
    pub fn new(store: VectorStore, embedder: Arc<dyn EmbeddingAdapter>) -> Self {
        Self {
            store,
            embedder,
            lambda_decay: DEFAULT_LAMBDA_DECAY,
            recency_weight: DEFAULT_RECENCY_WEIGHT,
        }
    }

    /// Overrides the ranking constants.
    pub fn with_ranking(mut self, lambda_decay: f64, recency_weight: f64) -> Self {
        self.lambda_decay = lambda_decay;
        self.recency_weight = recency_weight;
        self
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, MnemoError> {
        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| MnemoError::Internal("embedder returned no vectors".to_string()))
    }

    /// Persists an entry and returns its freshly assigned id.
    ///
    /// Ids are never reused. The entry date is written into the record
    /// metadata as an ISO-8601 string.
    pub async fn store_entry(&self, entry: &LogEntry) -> Result<String, MnemoError> {
        let embedding = self.embed_one(&entry.raw_text).await?;
        let id = Uuid::new_v4().to_string();

        self.store
            .add(VectorRecord {
                id: id.clone(),
                embedding,
                document: entry.raw_text.clone(),
                metadata: serde_json::json!({ "date": entry.date.to_rfc3339() }),
            })
            .await?;

        debug!(id = id.as_str(), "stored log entry");
        Ok(id)
    }

    /// Replaces the text of an existing entry, re-embedding it and
    /// preserving its date. Returns `false` if `id` is unknown.
    pub async fn update_entry(&self, id: &str, new_text: &str) -> Result<bool, MnemoError> {
        let existing = self.store.get(&[id.to_string()]).await?;
        let Some(record) = existing.into_iter().next() else {
            return Ok(false);
        };

        let embedding = self.embed_one(new_text).await?;
        self.store
            .update(id, &embedding, new_text, record.metadata)
            .await
    }

    /// Stores `text` as a new entry dated `date` (format `YYYY-MM-DD`).
    ///
    /// Returns the empty string, not an error, when the date fails to
    /// parse; callers treat an empty id as failure.
    pub async fn add_entry_for_date(&self, date: &str, text: &str) -> Result<String, MnemoError> {
        let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            warn!(date, "unparseable entry date, skipping insert");
            return Ok(String::new());
        };

        let entry = LogEntry::new(day.and_time(NaiveTime::MIN).and_utc(), text);
        self.store_entry(&entry).await
    }

    /// Deletes the entry with `id`. Returns `false` if it was absent.
    pub async fn delete_entry(&self, id: &str) -> Result<bool, MnemoError> {
        self.store.delete(id).await
    }

    /// Returns up to `limit` entries sorted by date descending.
    pub async fn get_all_entries(&self, limit: Option<usize>) -> Result<Vec<LogEntry>, MnemoError> {
        let records = self.store.get_all(limit).await?;
        let mut entries: Vec<LogEntry> = records
            .into_iter()
            .filter_map(|r| record_to_entry(r))
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    /// Searches for the `top_k` entries most relevant to `query`, ranked
    /// by similarity plus recency bias, using the current wall clock.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>, MnemoError> {
        self.search_at(query, top_k, Utc::now()).await
    }

    /// Searches relative to an explicit reference time.
    ///
    /// An empty query is valid: combined with the store's distance
    /// ordering it degenerates into "fetch up to `top_k` entries", which
    /// callers rely on.
    pub async fn search_at(
        &self,
        query: &str,
        top_k: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<SearchResult>, MnemoError> {
        let query_embedding = self.embed_one(query).await?;
        let candidates = self.store.query(&query_embedding, top_k).await?;

        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|(record, distance)| {
                let entry = record_to_entry(record)?;
                // Cosine distance is in [0, 2]; map to a [0, 1] similarity.
                let similarity = 1.0 - f64::from(distance) / 2.0;
                let age_days = (now - entry.date).num_days();
                let recency = recency_score(self.lambda_decay, age_days);
                Some(SearchResult {
                    final_score: similarity + self.recency_weight * recency,
                    similarity_score: similarity,
                    entry,
                })
            })
            .collect();

        // Stable sort: score ties keep the store's nearest-first order.
        results.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(results)
    }

    /// Removes every entry in the collection. See [`VectorStore::clear`]
    /// for the partial-failure recovery behavior.
    pub async fn clear(&self) -> Result<(), MnemoError> {
        self.store.clear().await
    }

    /// Number of stored entries.
    pub async fn count(&self) -> Result<usize, MnemoError> {
        self.store.count().await
    }
}

/// Rebuilds a [`LogEntry`] from a stored record. Records with missing or
/// undecodable date metadata are dropped with a warning rather than
/// failing the whole operation.
fn record_to_entry(record: VectorRecord) -> Option<LogEntry> {
    let date_str = record.metadata.get("date").and_then(|d| d.as_str())?;
    match DateTime::parse_from_rfc3339(date_str) {
        Ok(date) => Some(LogEntry {
            id: Some(record.id),
            date: date.with_timezone(&Utc),
            raw_text: record.document,
            summary: None,
            importance: 0.5,
        }),
        Err(e) => {
            warn!(id = record.id.as_str(), error = %e, "dropping record with bad date metadata");
            None
        }
    }
}
