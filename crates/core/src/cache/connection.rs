//! SQLite-backed cache store.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! for performance and concurrency (WAL mode), running migrations, and
//! implementing `CacheStore` on top of the `generations` and `entries` tables.

use super::hash::compute_entry_key;
use super::{CacheStore, CachedResponse, migrations};
use crate::Error;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use tokio_rusqlite::rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Entries are only ever stored for GET requests.
const ENTRY_METHOD: &str = "GET";

/// Persistent cache store.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pub(crate) conn: Connection,
}

impl SqliteStore {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}

fn row_to_entry(
    url: String, status: i64, kind: &str, headers_json: &str, body: Vec<u8>, cached_at: String,
) -> Result<CachedResponse, Error> {
    let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status out of range: {status}")))?;
    Ok(CachedResponse {
        url,
        status,
        kind: kind.parse()?,
        headers: serde_json::from_str(headers_json)?,
        body: Bytes::from(body),
        cached_at,
    })
}

type EntryRow = (String, i64, String, String, Vec<u8>, String);

fn read_entry_row(row: &tokio_rusqlite::rusqlite::Row<'_>) -> tokio_rusqlite::rusqlite::Result<EntryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

#[async_trait]
impl CacheStore for SqliteStore {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, name: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        let name = name.to_string();
        let key_hash = compute_entry_key(ENTRY_METHOD, key);
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let row = conn
                    .query_row(
                        "SELECT response_url, status, kind, headers_json, body, cached_at
                         FROM entries WHERE generation = ?1 AND key_hash = ?2",
                        params![name, key_hash],
                        read_entry_row,
                    )
                    .optional()?;

                row.map(|(url, status, kind, headers, body, cached_at)| {
                    row_to_entry(url, status, &kind, &headers, body, cached_at)
                })
                .transpose()
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, name: &str, key: &str, entry: CachedResponse) -> Result<(), Error> {
        self.put_all(name, vec![(key.to_string(), entry)]).await
    }

    async fn put_all(&self, name: &str, entries: Vec<(String, CachedResponse)>) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;

                for (key, entry) in &entries {
                    let headers_json = serde_json::to_string(&entry.headers)?;
                    tx.execute(
                        "INSERT INTO entries (
                            generation, key_hash, method, request_url, response_url,
                            status, kind, headers_json, body, cached_at
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                        ON CONFLICT(generation, key_hash) DO UPDATE SET
                            response_url = excluded.response_url,
                            status = excluded.status,
                            kind = excluded.kind,
                            headers_json = excluded.headers_json,
                            body = excluded.body,
                            cached_at = excluded.cached_at",
                        params![
                            &name,
                            compute_entry_key(ENTRY_METHOD, key),
                            ENTRY_METHOD,
                            key,
                            &entry.url,
                            entry.status as i64,
                            entry.kind.as_str(),
                            headers_json,
                            entry.body.as_ref(),
                            &entry.cached_at,
                        ],
                    )?;
                }

                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn entry_keys(&self, name: &str) -> Result<Vec<String>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT request_url FROM entries WHERE generation = ?1 ORDER BY request_url ASC")?;
                let keys = stmt
                    .query_map(params![name], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, key: &str) -> Result<Option<CachedResponse>, Error> {
        let key_hash = compute_entry_key(ENTRY_METHOD, key);
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.response_url, e.status, e.kind, e.headers_json, e.body, e.cached_at
                         FROM entries e JOIN generations g ON e.generation = g.name
                         WHERE e.key_hash = ?1
                         ORDER BY g.rowid ASC LIMIT 1",
                        params![key_hash],
                        read_entry_row,
                    )
                    .optional()?;

                row.map(|(url, status, kind, headers, body, cached_at)| {
                    row_to_entry(url, status, &kind, &headers, body, cached_at)
                })
                .transpose()
            })
            .await
            .map_err(Error::from)
    }
}
