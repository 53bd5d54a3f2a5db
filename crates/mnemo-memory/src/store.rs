// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed vector store with BLOB embedding storage.
//!
//! Each [`VectorStore`] wraps one named collection (one table). Nearest
//! neighbor queries are a brute-force cosine-distance scan over the
//! collection, which is exact and fast enough for personal-log scale.

use std::path::Path;

use mnemo_core::error::MnemoError;
use tokio_rusqlite::Connection;
use tracing::warn;

use crate::types::{blob_to_vec, cosine_distance, vec_to_blob, VectorRecord};

/// Helper to convert tokio_rusqlite errors into MnemoError::Storage.
fn storage_err(e: tokio_rusqlite::Error) -> MnemoError {
    MnemoError::Storage {
        source: Box::new(e),
    }
}

/// Helper to convert raw rusqlite errors (from connection open) into
/// MnemoError::Storage.
fn open_err(e: rusqlite::Error) -> MnemoError {
    MnemoError::Storage {
        source: Box::new(e),
    }
}

/// Persistent store for embedding records in SQLite.
///
/// Records are `(id, embedding, document, metadata)` rows. Ids are
/// caller-assigned and unique within the collection. The store itself
/// guarantees no result ordering beyond what each operation documents.
pub struct VectorStore {
    conn: Connection,
    table: String,
}

impl VectorStore {
    /// Opens (or creates) the collection `name` in the database at `path`.
    pub async fn open(path: &Path, name: &str) -> Result<Self, MnemoError> {
        let table = validate_collection_name(name)?;
        let conn = Connection::open(path.to_path_buf())
            .await
            .map_err(open_err)?;
        let store = Self { conn, table };
        store.init_schema().await?;
        Ok(store)
    }

    /// Opens the collection in a fresh in-memory database.
    pub async fn open_in_memory(name: &str) -> Result<Self, MnemoError> {
        let table = validate_collection_name(name)?;
        let conn = Connection::open_in_memory().await.map_err(open_err)?;
        let store = Self { conn, table };
        store.init_schema().await?;
        Ok(store)
    }

    /// Returns the collection name.
    pub fn collection(&self) -> &str {
        &self.table
    }

    async fn init_schema(&self) -> Result<(), MnemoError> {
        let ddl = create_table_sql(&self.table);
        self.conn
            .call(move |conn| {
                conn.execute_batch(&ddl)?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Inserts a new record. The id must be unique within the collection;
    /// inserting a duplicate id is a storage error.
    pub async fn add(&self, record: VectorRecord) -> Result<(), MnemoError> {
        let sql = format!(
            "INSERT INTO \"{}\" (id, embedding, document, metadata) VALUES (?1, ?2, ?3, ?4)",
            self.table
        );
        let embedding_blob = vec_to_blob(&record.embedding);
        let metadata = record.metadata.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    &sql,
                    rusqlite::params![record.id, embedding_blob, record.document, metadata],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    /// Atomically replaces embedding, document, and metadata for `id`.
    ///
    /// Returns `false` (the not-found signal) if no record has that id.
    pub async fn update(
        &self,
        id: &str,
        embedding: &[f32],
        document: &str,
        metadata: serde_json::Value,
    ) -> Result<bool, MnemoError> {
        let sql = format!(
            "UPDATE \"{}\" SET embedding = ?2, document = ?3, metadata = ?4 WHERE id = ?1",
            self.table
        );
        let id = id.to_string();
        let embedding_blob = vec_to_blob(embedding);
        let document = document.to_string();
        let metadata = metadata.to_string();
        self.conn
            .call(move |conn| {
                let changed =
                    conn.execute(&sql, rusqlite::params![id, embedding_blob, document, metadata])?;
                Ok(changed > 0)
            })
            .await
            .map_err(storage_err)
    }

    /// Removes the record with `id`. Returns `false` if it was absent.
    pub async fn delete(&self, id: &str) -> Result<bool, MnemoError> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = ?1", self.table);
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let changed = conn.execute(&sql, rusqlite::params![id])?;
                Ok(changed > 0)
            })
            .await
            .map_err(storage_err)
    }

    /// Returns the records matching `ids`. Missing ids are silently
    /// omitted; order is not guaranteed.
    pub async fn get(&self, ids: &[String]) -> Result<Vec<VectorRecord>, MnemoError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "SELECT id, embedding, document, metadata FROM \"{}\" WHERE id IN ({})",
            self.table,
            placeholders.join(", ")
        );
        let ids = ids.to_vec();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let params: Vec<&dyn rusqlite::types::ToSql> =
                    ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
                let records = stmt
                    .query_map(params.as_slice(), |row| Ok(row_to_record(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
            .map_err(storage_err)
    }

    /// Returns up to `limit` records (all records when `None`), in
    /// insertion order.
    pub async fn get_all(&self, limit: Option<usize>) -> Result<Vec<VectorRecord>, MnemoError> {
        let sql = match limit {
            Some(n) => format!(
                "SELECT id, embedding, document, metadata FROM \"{}\" ORDER BY rowid LIMIT {n}",
                self.table
            ),
            None => format!(
                "SELECT id, embedding, document, metadata FROM \"{}\" ORDER BY rowid",
                self.table
            ),
        };
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let records = stmt
                    .query_map([], |row| Ok(row_to_record(row)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(records)
            })
            .await
            .map_err(storage_err)
    }

    /// Returns the `k` nearest records to `vector` by cosine distance,
    /// nearest first, each with its distance in [0, 2]. Distance ties
    /// keep insertion order.
    pub async fn query(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<(VectorRecord, f32)>, MnemoError> {
        let records = self.get_all(None).await?;

        let mut scored: Vec<(VectorRecord, f32)> = records
            .into_iter()
            .filter(|r| r.embedding.len() == vector.len())
            .map(|r| {
                let d = cosine_distance(vector, &r.embedding);
                (r, d)
            })
            .collect();

        // Stable sort: equal distances stay in insertion order.
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }

    /// Returns the number of records in the collection.
    pub async fn count(&self) -> Result<usize, MnemoError> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", self.table);
        self.conn
            .call(move |conn| {
                let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
                Ok(n as usize)
            })
            .await
            .map_err(storage_err)
    }

    /// Removes all records from the collection.
    ///
    /// The primary path drops and recreates the table. If that fails
    /// partway (e.g., the table is locked by another statement), a
    /// fallback path reuses the existing table and deletes its rows, so
    /// the collection is left usable either way.
    pub async fn clear(&self) -> Result<(), MnemoError> {
        let table = self.table.clone();
        let ddl = create_table_sql(&self.table);
        let dropped: Result<(), tokio_rusqlite::Error> = self
            .conn
            .call(move |conn| {
                conn.execute_batch(&format!("DROP TABLE IF EXISTS \"{table}\"; {ddl}"))?;
                Ok(())
            })
            .await;

        match dropped {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, collection = self.table.as_str(),
                    "drop-and-recreate failed, falling back to row delete");
                let table = self.table.clone();
                let ddl = create_table_sql(&self.table);
                self.conn
                    .call(move |conn| {
                        // Recreate in case the drop half succeeded, then empty it.
                        conn.execute_batch(&ddl)?;
                        conn.execute(&format!("DELETE FROM \"{table}\""), [])?;
                        Ok(())
                    })
                    .await
                    .map_err(storage_err)
            }
        }
    }
}

/// DDL for a collection table.
fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (
            id TEXT PRIMARY KEY NOT NULL,
            embedding BLOB NOT NULL,
            document TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{{}}'
        );"
    )
}

/// Collection names become table names, so restrict them to identifier
/// characters.
fn validate_collection_name(name: &str) -> Result<String, MnemoError> {
    let valid = !name.is_empty()
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name.to_string())
    } else {
        Err(MnemoError::Config(format!(
            "invalid collection name {name:?}: use letters, digits, and underscores"
        )))
    }
}

/// Convert a rusqlite Row to a VectorRecord.
fn row_to_record(row: &rusqlite::Row) -> VectorRecord {
    let embedding_blob: Vec<u8> = row.get(1).unwrap_or_default();
    let metadata_str: String = row.get(3).unwrap_or_default();

    VectorRecord {
        id: row.get(0).unwrap_or_default(),
        embedding: blob_to_vec(&embedding_blob),
        document: row.get(2).unwrap_or_default(),
        metadata: serde_json::from_str(&metadata_str)
            .unwrap_or(serde_json::Value::Object(Default::default())),
    }
}
