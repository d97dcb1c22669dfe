//! Metadata store (C5): repositories, files, and Merkle nodes in SQLite with
//! WAL journaling, foreign keys on, and idempotent numbered migrations.
//! Opened lazily as a process-wide handle (§5) and passed explicitly into
//! every operation — grounded in the teacher's symbol-graph schema module,
//! generalized to this crate's data model.

use crate::domain::{FileRecord, MerkleNode, Repository};
use crate::error::{IndexError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

pub const SCHEMA_VERSION: i64 = 1;

pub struct MetadataStore {
    conn: Connection,
}

impl MetadataStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| IndexError::IoFailure { path: parent.display().to_string(), source: e })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);",
        )?;
        let current: Option<i64> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
            .optional()?;

        match current {
            None => {
                self.conn.execute_batch(MIGRATION_V1)?;
                self.conn.execute("INSERT INTO schema_version(version) VALUES (?1)", [SCHEMA_VERSION])?;
            }
            Some(v) if v == SCHEMA_VERSION => {}
            Some(v) => {
                return Err(IndexError::SchemaFailure(format!(
                    "unsupported metadata schema version {v}; expected {SCHEMA_VERSION}"
                )));
            }
        }
        Ok(())
    }

    // --- repositories ---

    pub fn create_repo(&self, id: &str, name: &str, path: &str, collection_name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO repositories(id, name, path, collection_name, ingested_at) VALUES (?1, ?2, ?3, ?4, NULL)",
            params![id, name, path, collection_name],
        )?;
        Ok(())
    }

    pub fn get_repo_by_name(&self, name: &str) -> Result<Option<Repository>> {
        self.conn
            .query_row(
                "SELECT id, name, path, collection_name, ingested_at FROM repositories WHERE name = ?1",
                [name],
                row_to_repository,
            )
            .optional()
            .map_err(IndexError::from)
    }

    pub fn get_repo_by_path(&self, path: &str) -> Result<Option<Repository>> {
        self.conn
            .query_row(
                "SELECT id, name, path, collection_name, ingested_at FROM repositories WHERE path = ?1",
                [path],
                row_to_repository,
            )
            .optional()
            .map_err(IndexError::from)
    }

    pub fn list_repos(&self) -> Result<Vec<Repository>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, path, collection_name, ingested_at FROM repositories ORDER BY name",
        )?;
        let rows = stmt.query_map([], row_to_repository)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn update_repo_ingested_at(&self, repo_id: &str, timestamp: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE repositories SET ingested_at = ?1 WHERE id = ?2",
            params![timestamp, repo_id],
        )?;
        Ok(())
    }

    pub fn delete_repo(&self, repo_id: &str) -> Result<()> {
        self.conn.execute("DELETE FROM repositories WHERE id = ?1", [repo_id])?;
        Ok(())
    }

    // --- files ---

    pub fn upsert_file(&self, file: &FileRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO files(repository_id, file_path, content_hash, size_bytes, language, chunk_count, skipped, last_modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(repository_id, file_path) DO UPDATE SET
                content_hash = excluded.content_hash,
                size_bytes = excluded.size_bytes,
                language = excluded.language,
                chunk_count = excluded.chunk_count,
                skipped = excluded.skipped,
                last_modified = excluded.last_modified",
            params![
                file.repository_id,
                file.file_path,
                file.content_hash,
                file.size_bytes as i64,
                file.language,
                file.chunk_count as i64,
                file.skipped,
                file.last_modified,
            ],
        )?;
        Ok(())
    }

    pub fn get_files_by_repo(&self, repo_id: &str) -> Result<Vec<FileRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT repository_id, file_path, content_hash, size_bytes, language, chunk_count, skipped, last_modified
             FROM files WHERE repository_id = ?1",
        )?;
        let rows = stmt.query_map([repo_id], row_to_file)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn file_hashes_by_repo(&self, repo_id: &str) -> Result<BTreeMap<String, String>> {
        let mut stmt = self.conn.prepare(
            "SELECT file_path, content_hash FROM files WHERE repository_id = ?1 AND skipped = 0",
        )?;
        let rows = stmt.query_map([repo_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut out = BTreeMap::new();
        for row in rows {
            let (path, hash) = row?;
            out.insert(path, hash);
        }
        Ok(out)
    }

    pub fn get_file_count(&self, repo_id: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM files WHERE repository_id = ?1 AND skipped = 0",
            [repo_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn delete_files_by_paths(&self, repo_id: &str, paths: &[String]) -> Result<usize> {
        if paths.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; paths.len()].join(",");
        let sql = format!(
            "DELETE FROM files WHERE repository_id = ? AND file_path IN ({placeholders})"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut bound: Vec<&dyn rusqlite::ToSql> = vec![&repo_id];
        for p in paths {
            bound.push(p);
        }
        let n = stmt.execute(bound.as_slice())?;
        Ok(n)
    }

    // --- merkle nodes ---

    pub fn batch_upsert_merkle_nodes(&mut self, nodes: &[MerkleNode]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO merkle_nodes(repository_id, node_path, node_hash, is_directory)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(repository_id, node_path) DO UPDATE SET
                    node_hash = excluded.node_hash,
                    is_directory = excluded.is_directory",
            )?;
            for node in nodes {
                stmt.execute(params![
                    node.repository_id,
                    node.node_path,
                    node.node_hash,
                    node.is_directory
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn delete_merkle_nodes_by_paths(&self, repo_id: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let placeholders = vec!["?"; paths.len()].join(",");
        let sql = format!(
            "DELETE FROM merkle_nodes WHERE repository_id = ? AND node_path IN ({placeholders})"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut bound: Vec<&dyn rusqlite::ToSql> = vec![&repo_id];
        for p in paths {
            bound.push(p);
        }
        stmt.execute(bound.as_slice())?;
        Ok(())
    }

    pub fn get_merkle_nodes(&self, repo_id: &str) -> Result<Vec<MerkleNode>> {
        let mut stmt = self.conn.prepare(
            "SELECT repository_id, node_path, node_hash, is_directory FROM merkle_nodes
             WHERE repository_id = ?1 ORDER BY node_path",
        )?;
        let rows = stmt.query_map([repo_id], |row| {
            Ok(MerkleNode {
                repository_id: row.get(0)?,
                node_path: row.get(1)?,
                node_hash: row.get(2)?,
                is_directory: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

const MIGRATION_V1: &str = "
CREATE TABLE IF NOT EXISTS repositories (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    path TEXT NOT NULL,
    collection_name TEXT NOT NULL,
    ingested_at TEXT
);

CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    file_path TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    language TEXT,
    chunk_count INTEGER NOT NULL DEFAULT 0,
    skipped INTEGER NOT NULL DEFAULT 0,
    last_modified TEXT NOT NULL,
    UNIQUE(repository_id, file_path)
);
CREATE INDEX IF NOT EXISTS idx_files_repo ON files(repository_id);

CREATE TABLE IF NOT EXISTS merkle_nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository_id TEXT NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    node_path TEXT NOT NULL,
    node_hash TEXT NOT NULL,
    is_directory INTEGER NOT NULL,
    UNIQUE(repository_id, node_path)
);
CREATE INDEX IF NOT EXISTS idx_merkle_repo ON merkle_nodes(repository_id);
";

fn row_to_repository(row: &rusqlite::Row) -> rusqlite::Result<Repository> {
    Ok(Repository {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        collection_name: row.get(3)?,
        ingested_at: row.get(4)?,
    })
}

fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        repository_id: row.get(0)?,
        file_path: row.get(1)?,
        content_hash: row.get(2)?,
        size_bytes: row.get::<_, i64>(3)? as u64,
        language: row.get(4)?,
        chunk_count: row.get::<_, i64>(5)? as u64,
        skipped: row.get(6)?,
        last_modified: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_schema_and_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let db = tmp.path().join("metadata.db");
        MetadataStore::open(&db).unwrap();
        MetadataStore::open(&db).unwrap();
    }

    #[test]
    fn repository_crud_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = MetadataStore::open(&tmp.path().join("m.db")).unwrap();
        store.create_repo("r1", "demo", "/repo", "demo-collection").unwrap();

        let found = store.get_repo_by_name("demo").unwrap().unwrap();
        assert_eq!(found.id, "r1");
        assert_eq!(found.collection_name, "demo-collection");

        store.update_repo_ingested_at("r1", "2026-01-01T00:00:00Z").unwrap();
        let updated = store.get_repo_by_name("demo").unwrap().unwrap();
        assert_eq!(updated.ingested_at.as_deref(), Some("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn delete_repo_cascades_to_files_and_merkle_nodes() {
        let tmp = TempDir::new().unwrap();
        let mut store = MetadataStore::open(&tmp.path().join("m.db")).unwrap();
        store.create_repo("r1", "demo", "/repo", "demo-collection").unwrap();
        store
            .upsert_file(&FileRecord {
                repository_id: "r1".into(),
                file_path: "a.py".into(),
                content_hash: "h1".into(),
                size_bytes: 10,
                language: Some("python".into()),
                chunk_count: 1,
                skipped: false,
                last_modified: "2026-01-01T00:00:00Z".into(),
            })
            .unwrap();
        store
            .batch_upsert_merkle_nodes(&[MerkleNode {
                repository_id: "r1".into(),
                node_path: "a.py".into(),
                node_hash: "h1".into(),
                is_directory: false,
            }])
            .unwrap();

        store.delete_repo("r1").unwrap();

        assert!(store.get_files_by_repo("r1").unwrap().is_empty());
        assert!(store.get_merkle_nodes("r1").unwrap().is_empty());
    }

    #[test]
    fn file_upsert_is_keyed_on_repo_and_path() {
        let tmp = TempDir::new().unwrap();
        let store = MetadataStore::open(&tmp.path().join("m.db")).unwrap();
        store.create_repo("r1", "demo", "/repo", "demo-collection").unwrap();

        let mut record = FileRecord {
            repository_id: "r1".into(),
            file_path: "a.py".into(),
            content_hash: "h1".into(),
            size_bytes: 10,
            language: Some("python".into()),
            chunk_count: 1,
            skipped: false,
            last_modified: "2026-01-01T00:00:00Z".into(),
        };
        store.upsert_file(&record).unwrap();
        record.content_hash = "h2".into();
        store.upsert_file(&record).unwrap();

        let files = store.get_files_by_repo("r1").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content_hash, "h2");
    }
}
