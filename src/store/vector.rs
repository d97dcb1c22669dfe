//! Vector store contract (C6) and a SQLite-backed reference implementation.
//!
//! The indexing core treats embedding/nearest-neighbour search as an
//! external collaborator (§4.6); this module defines the trait the pipeline
//! depends on and ships one concrete, runnable implementation grounded in
//! the teacher's own FTS5-backed `chunk_fts` table (`src/cli/index.rs`) so
//! the crate works end to end without a real embedding service.

use crate::error::Result;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;

pub const UPSERT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorItem {
    pub id: String,
    pub document: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub metadata: BTreeMap<String, String>,
    pub distance: f64,
}

pub trait VectorStore {
    fn upsert(&mut self, collection: &str, items: &[VectorItem]) -> Result<()>;
    fn delete(&mut self, collection: &str, ids: &[String]) -> Result<()>;
    fn delete_by_metadata(&mut self, collection: &str, key: &str, value: &str) -> Result<()>;
    fn delete_collection(&mut self, collection: &str) -> Result<()>;
    fn query(
        &self,
        collection: &str,
        text: &str,
        metadata_filter: Option<(&str, &str)>,
        limit: usize,
    ) -> Result<Vec<QueryHit>>;
}

/// Reference [`VectorStore`]: one SQLite database, one FTS5 table per
/// collection, metadata serialized as JSON alongside each document.
pub struct SqliteVectorStore {
    conn: Connection,
}

impl SqliteVectorStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| crate::error::IndexError::IoFailure { path: parent.display().to_string(), source: e })?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    fn ensure_collection(&self, collection: &str) -> Result<()> {
        let table = table_name(collection);
        self.conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS {table} USING fts5(id UNINDEXED, document, metadata UNINDEXED);"
        ))?;
        Ok(())
    }
}

impl VectorStore for SqliteVectorStore {
    fn upsert(&mut self, collection: &str, items: &[VectorItem]) -> Result<()> {
        self.ensure_collection(collection)?;
        let table = table_name(collection);
        for batch in items.chunks(UPSERT_BATCH_SIZE) {
            let tx = self.conn.transaction()?;
            {
                let mut stmt = tx.prepare(&format!(
                    "DELETE FROM {table} WHERE id = ?1"
                ))?;
                let mut insert = tx.prepare(&format!(
                    "INSERT INTO {table}(id, document, metadata) VALUES (?1, ?2, ?3)"
                ))?;
                for item in batch {
                    stmt.execute([&item.id])?;
                    let metadata_json = serde_json::to_string(&item.metadata).unwrap_or_default();
                    insert.execute(params![item.id, item.document, metadata_json])?;
                }
            }
            tx.commit()?;
        }
        Ok(())
    }

    fn delete(&mut self, collection: &str, ids: &[String]) -> Result<()> {
        self.ensure_collection(collection)?;
        if ids.is_empty() {
            return Ok(());
        }
        let table = table_name(collection);
        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!("DELETE FROM {table} WHERE id IN ({placeholders})");
        let mut stmt = self.conn.prepare(&sql)?;
        let bound: Vec<&dyn rusqlite::ToSql> = ids.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
        stmt.execute(bound.as_slice())?;
        Ok(())
    }

    fn delete_by_metadata(&mut self, collection: &str, key: &str, value: &str) -> Result<()> {
        self.ensure_collection(collection)?;
        let table = table_name(collection);
        let ids = self.matching_ids(&table, key, value)?;
        self.delete(collection, &ids)
    }

    fn delete_collection(&mut self, collection: &str) -> Result<()> {
        let table = table_name(collection);
        self.conn.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
        Ok(())
    }

    fn query(
        &self,
        collection: &str,
        text: &str,
        metadata_filter: Option<(&str, &str)>,
        limit: usize,
    ) -> Result<Vec<QueryHit>> {
        self.ensure_collection(collection)?;
        let table = table_name(collection);
        let query_text = sanitize_match_query(text);
        if query_text.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, document, metadata, bm25({table}) AS score FROM {table}
             WHERE {table} MATCH ?1 ORDER BY score LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![query_text, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, document, metadata_json, distance) = row?;
            let metadata: BTreeMap<String, String> =
                serde_json::from_str(&metadata_json).unwrap_or_default();
            if let Some((k, v)) = metadata_filter {
                if metadata.get(k).map(|s| s.as_str()) != Some(v) {
                    continue;
                }
            }
            hits.push(QueryHit { id, document, metadata, distance });
        }
        Ok(hits)
    }
}

impl SqliteVectorStore {
    fn matching_ids(&self, table: &str, key: &str, value: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!("SELECT id, metadata FROM {table}"))?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut ids = Vec::new();
        for row in rows {
            let (id, metadata_json) = row?;
            let metadata: BTreeMap<String, String> =
                serde_json::from_str(&metadata_json).unwrap_or_default();
            if metadata.get(key).map(|s| s.as_str()) == Some(value) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

fn table_name(collection: &str) -> String {
    let cleaned: String =
        collection.chars().map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' }).collect();
    format!("chunks_{cleaned}")
}

fn sanitize_match_query(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(id: &str, doc: &str, file_path: &str) -> VectorItem {
        let mut metadata = BTreeMap::new();
        metadata.insert("file_path".to_string(), file_path.to_string());
        VectorItem { id: id.to_string(), document: doc.to_string(), metadata }
    }

    #[test]
    fn upsert_then_query_finds_document() {
        let tmp = TempDir::new().unwrap();
        let mut store = SqliteVectorStore::open(&tmp.path().join("v.db")).unwrap();
        store.upsert("demo", &[item("c1", "def foo bar baz", "a.py")]).unwrap();

        let hits = store.query("demo", "foo", None, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "c1");
    }

    #[test]
    fn delete_by_metadata_removes_matching_rows() {
        let tmp = TempDir::new().unwrap();
        let mut store = SqliteVectorStore::open(&tmp.path().join("v.db")).unwrap();
        store
            .upsert(
                "demo",
                &[item("c1", "alpha content", "a.py"), item("c2", "beta content", "b.py")],
            )
            .unwrap();

        store.delete_by_metadata("demo", "file_path", "a.py").unwrap();

        let hits = store.query("demo", "alpha", None, 10).unwrap();
        assert!(hits.is_empty());
        let hits = store.query("demo", "beta", None, 10).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn delete_collection_drops_the_table() {
        let tmp = TempDir::new().unwrap();
        let mut store = SqliteVectorStore::open(&tmp.path().join("v.db")).unwrap();
        store.upsert("demo", &[item("c1", "alpha content", "a.py")]).unwrap();

        store.delete_collection("demo").unwrap();

        let hits = store.query("demo", "alpha", None, 10).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn upsert_is_idempotent_for_same_id() {
        let tmp = TempDir::new().unwrap();
        let mut store = SqliteVectorStore::open(&tmp.path().join("v.db")).unwrap();
        store.upsert("demo", &[item("c1", "version one", "a.py")]).unwrap();
        store.upsert("demo", &[item("c1", "version two", "a.py")]).unwrap();

        let hits = store.query("demo", "version", None, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document, "version two");
    }
}
