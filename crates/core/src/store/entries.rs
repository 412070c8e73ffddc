//! Partition and entry operations.
//!
//! Entries are full response snapshots keyed by the normalized request
//! identity. Writes are whole-row upserts, so concurrent strategy writes
//! never leave a partially updated entry behind.

use super::connection::CacheStore;
use super::hash::entry_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached response snapshot.
///
/// Captures everything needed to replay a response without the network:
/// status, headers and body, plus the request identity that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedResponse {
    /// Build a snapshot from response parts, computing the entry key.
    pub fn new(method: &str, url: &str, status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self {
            key: entry_key(method, url),
            method: method.to_uppercase(),
            url: url.to_string(),
            status,
            headers,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Whether the snapshot carries a success status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl CacheStore {
    /// Ensure a partition exists.
    ///
    /// Opening an already-open partition is a no-op, mirroring how the
    /// strategies treat partitions as always-available namespaces.
    pub async fn open_partition(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![name, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite an entry in a partition.
    ///
    /// Uses UPSERT semantics keyed on (partition, key). The partition is
    /// created on demand so strategy writes never race lifecycle setup.
    pub async fn upsert_entry(&self, partition: &str, entry: &CachedResponse) -> Result<(), Error> {
        let partition = partition.to_string();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![partition, chrono::Utc::now().to_rfc3339()],
                )?;

                let headers_json = serde_json::to_string(&entry.headers)
                    .map_err(|e| Error::InvalidInput(format!("unserializable headers: {e}")))?;

                conn.execute(
                    "INSERT INTO entries (
                        partition_name, key, method, url, status, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(partition_name, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &partition,
                        &entry.key,
                        &entry.method,
                        &entry.url,
                        entry.status as i64,
                        &headers_json,
                        &entry.body,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry from a partition by key.
    ///
    /// Returns None if the partition or key doesn't exist.
    pub async fn get_entry(&self, partition: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        let partition = partition.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, method, url, status, headers_json, body, stored_at
                     FROM entries WHERE partition_name = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![partition, key], |row| {
                    let headers_json: String = row.get(4)?;
                    Ok(CachedResponse {
                        key: row.get(0)?,
                        method: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get::<_, i64>(3)? as u16,
                        headers: serde_json::from_str(&headers_json).unwrap_or_default(),
                        body: row.get(5)?,
                        stored_at: row.get(6)?,
                    })
                });

                match result {
                    Ok(e) => Ok(Some(e)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry by request identity instead of a precomputed key.
    pub async fn match_request(&self, partition: &str, method: &str, url: &str) -> Result<Option<CachedResponse>, Error> {
        self.get_entry(partition, &entry_key(method, url)).await
    }

    /// Enumerate all partition names.
    pub async fn list_partitions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and all of its entries.
    ///
    /// Returns the number of partitions removed (0 or 1); entries go
    /// with it via cascade.
    pub async fn delete_partition(&self, name: &str) -> Result<u64, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Count entries in a partition.
    pub async fn count_entries(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE partition_name = ?1",
                    params![partition],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
