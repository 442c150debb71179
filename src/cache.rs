//! SQLite-backed persistence for the obfuscation cache and the last good
//! copy of the release manifest

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::CacheError;
use crate::release::aggregator::{CachedManifest, ManifestStore};
use crate::release::obfuscation::{ObfuscationCacheEntry, ObfuscationStore};

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[];

pub struct Cache {
    conn: Mutex<Connection>,
}

impl Cache {
    pub fn new(db_path: &Path) -> Result<Self, CacheError> {
        info!("Initializing cache database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!("Database connection established");

        let cache = Self {
            conn: Mutex::new(conn),
        };

        cache.create_schema()?;
        info!("Cache initialized successfully");

        Ok(cache)
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    /// Get current timestamp in milliseconds since UNIX epoch
    fn current_timestamp_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS obfuscation (
                release_id TEXT PRIMARY KEY,
                hash TEXT,
                obfuscated INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS manifests (
                url TEXT PRIMARY KEY,
                body BLOB NOT NULL,
                fetched_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Self::apply_migrations(&conn)?;

        debug!("Database schema created successfully");
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), CacheError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    match conn.execute(sql, []) {
                        Ok(_) => {}
                        Err(rusqlite::Error::SqliteFailure(_, Some(ref msg)))
                            if msg.contains("duplicate column name") =>
                        {
                            debug!("Column already exists, skipping: {}", sql);
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
            debug!("Updated schema version to v{}", target_version);
        }

        Ok(())
    }
}

impl ObfuscationStore for Cache {
    fn load_entries(&self) -> Result<Vec<ObfuscationCacheEntry>, CacheError> {
        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare("SELECT release_id, hash, obfuscated FROM obfuscation ORDER BY release_id")?;

        let entries = stmt
            .query_map([], |row| {
                Ok(ObfuscationCacheEntry {
                    release_id: row.get(0)?,
                    hash: row.get(1)?,
                    obfuscated: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn replace_entries(&self, entries: &[ObfuscationCacheEntry]) -> Result<(), CacheError> {
        debug!("Writing {} obfuscation cache entries", entries.len());

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM obfuscation", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO obfuscation (release_id, hash, obfuscated) VALUES (?1, ?2, ?3)",
            )?;
            for entry in entries {
                stmt.execute((&entry.release_id, &entry.hash, entry.obfuscated))?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

impl ManifestStore for Cache {
    fn save_manifest(&self, url: &str, body: &[u8]) -> Result<(), CacheError> {
        let now = Self::current_timestamp_ms();
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            INSERT INTO manifests (url, body, fetched_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(url) DO UPDATE SET body = excluded.body, fetched_at = excluded.fetched_at
            "#,
            (url, body, now),
        )?;

        Ok(())
    }

    fn load_manifest(&self, url: &str) -> Result<Option<CachedManifest>, CacheError> {
        let conn = self.lock_conn()?;

        let cached = conn
            .query_row(
                "SELECT body, fetched_at FROM manifests WHERE url = ?1",
                [url],
                |row| {
                    Ok(CachedManifest {
                        body: row.get(0)?,
                        fetched_at_ms: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(cached)
    }
}
