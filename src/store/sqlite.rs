//! SQLite-backed entity store
//!
//! Manages `~/.stepquest/progress.db` with automatic schema migration.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};

use super::{EntityKey, PersistenceStore, StoreError, StoredBlob};
use crate::config::Config;

/// Database wrapper holding the entity blob table
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create the database at the default location (~/.stepquest/progress.db)
    pub fn open_default() -> Result<Self> {
        let db_path = Config::global_config_dir().join("progress.db");
        Self::open(&db_path)
    }

    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open progress db: {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::with_connection(conn)
    }

    /// In-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to create progress schema")?;
        drop(conn);
        self.run_migrations()
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn();

        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| {
                r.get(0)
            })
            .unwrap_or(0);

        // Migration 2: track when each blob was last written
        if version < 2 {
            let has_updated_at: bool = conn
                .prepare(
                    "SELECT COUNT(*) FROM pragma_table_info('entity_blobs') WHERE name = 'updated_at'",
                )
                .and_then(|mut s| s.query_row([], |r| r.get::<_, i32>(0)))
                .map(|c| c > 0)
                .unwrap_or(false);

            if !has_updated_at {
                conn.execute_batch(
                    "ALTER TABLE entity_blobs ADD COLUMN updated_at INTEGER NOT NULL DEFAULT 0;",
                )?;
            }

            conn.execute("INSERT OR REPLACE INTO schema_version VALUES (2)", [])?;
        }

        // Migration 3: generation floor left behind by a wipe
        if version < 3 {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS store_floor (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    generation INTEGER NOT NULL
                );
                INSERT OR REPLACE INTO schema_version VALUES (3);
                "#,
            )?;
        }

        Ok(())
    }

    /// Stored generation per key, for diagnostics
    pub fn generations(&self) -> Result<Vec<(String, u64)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key, generation FROM entity_blobs ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .filter_map(|r| r.ok())
            .map(|(key, generation)| (key, generation.max(0) as u64))
            .collect();
        Ok(rows)
    }
}

impl PersistenceStore for SqliteStore {
    fn load(&self, key: EntityKey) -> Result<Option<StoredBlob>, StoreError> {
        let conn = self.conn();
        let blob = conn
            .query_row(
                "SELECT schema_version, generation, payload FROM entity_blobs WHERE key = ?1",
                [key.as_str()],
                |r| {
                    Ok(StoredBlob {
                        schema_version: r.get::<_, u32>(0)?,
                        generation: r.get::<_, i64>(1)?.max(0) as u64,
                        payload: r.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(blob)
    }

    fn store(&self, key: EntityKey, blob: &StoredBlob) -> Result<(), StoreError> {
        let conn = self.conn();
        if blob.generation < read_floor(&conn)? {
            return Ok(());
        }
        conn.execute(
            r#"
            INSERT INTO entity_blobs (key, schema_version, generation, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(key) DO UPDATE SET
                schema_version = excluded.schema_version,
                generation = excluded.generation,
                payload = excluded.payload,
                updated_at = excluded.updated_at
            WHERE excluded.generation >= entity_blobs.generation
            "#,
            rusqlite::params![
                key.as_str(),
                blob.schema_version,
                blob.generation as i64,
                blob.payload,
                Utc::now().timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn remove(&self, key: EntityKey) -> Result<(), StoreError> {
        self.conn()
            .execute("DELETE FROM entity_blobs WHERE key = ?1", [key.as_str()])?;
        Ok(())
    }

    fn clear(&self, floor_generation: u64) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM entity_blobs", [])?;
        tx.execute(
            r#"
            INSERT INTO store_floor (id, generation) VALUES (1, ?1)
            ON CONFLICT(id) DO UPDATE SET generation = MAX(generation, excluded.generation)
            "#,
            [floor_generation as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn floor_generation(&self) -> Result<u64, StoreError> {
        read_floor(&self.conn())
    }
}

fn read_floor(conn: &Connection) -> Result<u64, StoreError> {
    let floor: Option<i64> = conn
        .query_row("SELECT generation FROM store_floor WHERE id = 1", [], |r| r.get(0))
        .optional()?;
    Ok(floor.unwrap_or(0).max(0) as u64)
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- One row per entity type
CREATE TABLE IF NOT EXISTS entity_blobs (
    key TEXT PRIMARY KEY,
    schema_version INTEGER NOT NULL,
    generation INTEGER NOT NULL,
    payload TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version VALUES (1);
"#;
