//! TTL'd key/value storage for pipeline artifacts.
//!
//! Answers, search result lists and related questions are all stored as text
//! rows with an absolute expiry. Reads ignore expired rows; the rows
//! themselves are removed by [`CacheDb::purge_expired`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_rusqlite::params;

use super::connection::CacheDb;
use crate::Error;

/// Time-to-live applied to every artifact unless configured otherwise (3 hours).
pub const DEFAULT_TTL: Duration = Duration::from_secs(10_800);

/// Key/value store with per-entry TTL shared by all requests.
///
/// `get` returns `Ok(None)` when the key is absent or expired and an error
/// only when the storage itself failed, so callers can tell a miss from an
/// outage.
#[async_trait]
pub trait ArtifactCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error>;
}

#[async_trait]
impl ArtifactCache for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.get_artifact(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error> {
        self.put_artifact(key, value, ttl).await
    }
}

impl CacheDb {
    /// Get a fresh artifact by key.
    ///
    /// Returns None if the key doesn't exist or its TTL has elapsed.
    pub async fn get_artifact(&self, key: &str) -> Result<Option<String>, Error> {
        let key = key.to_string();
        let now = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM artifacts WHERE key = ?1 AND expires_at > ?2")?;

                let result = stmt.query_row(params![key, now], |row| row.get(0));

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite an artifact.
    ///
    /// Uses UPSERT semantics, so concurrent writers for the same key resolve
    /// to the last write.
    pub async fn put_artifact(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_string();

        let stored_at = Utc::now().timestamp_millis();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = stored_at.saturating_add(ttl_ms);

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO artifacts (key, value, stored_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        stored_at = excluded.stored_at,
                        expires_at = excluded.expires_at",
                    params![key, value, stored_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired artifacts.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM artifacts WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of stored rows, expired or not.
    pub async fn artifact_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM artifacts", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::CacheKey;
    use serde::{Deserialize, Serialize};

    #[tokio::test]
    async fn test_put_and_get_artifact() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_artifact("en : weather today", "It is sunny.", DEFAULT_TTL).await.unwrap();

        let retrieved = db.get_artifact("en : weather today").await.unwrap();
        assert_eq!(retrieved.as_deref(), Some("It is sunny."));
    }

    #[tokio::test]
    async fn test_get_missing_artifact() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get_artifact("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ttl_boundary() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set("short", "value", Duration::from_secs(1)).await.unwrap();

        assert_eq!(db.get("short").await.unwrap().as_deref(), Some("value"));
        tokio::time::sleep(Duration::from_millis(1_200)).await;
        assert!(db.get("short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_artifact("expiring", "a", Duration::from_secs(1)).await.unwrap();
        db.put_artifact("fresh", "b", DEFAULT_TTL).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_200)).await;

        let deleted = db.purge_expired().await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(db.artifact_count().await.unwrap(), 1);
        assert!(db.get_artifact("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_last_write_wins() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_artifact("k", "first", DEFAULT_TTL).await.unwrap();
        db.put_artifact("k", "second", DEFAULT_TTL).await.unwrap();

        assert_eq!(db.get_artifact("k").await.unwrap().as_deref(), Some("second"));
        assert_eq!(db.artifact_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_artifact_kinds_are_independent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = CacheKey::new("weather today", "en");
        db.set(key.answer(), "answer", DEFAULT_TTL).await.unwrap();
        db.set(&key.results(), "[]", Duration::from_secs(1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_200)).await;

        assert_eq!(db.get(key.answer()).await.unwrap().as_deref(), Some("answer"));
        assert!(db.get(&key.results()).await.unwrap().is_none());
        assert!(db.get(&key.related_questions()).await.unwrap().is_none());
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        name: String,
        url: String,
        snippet: String,
    }

    #[tokio::test]
    async fn test_json_list_round_trip_preserves_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let rows: Vec<Row> = (1..=3)
            .map(|i| Row { name: format!("t{i}"), url: format!("https://e{i}.com"), snippet: String::new() })
            .collect();

        db.set("en : q : results", &serde_json::to_string(&rows).unwrap(), DEFAULT_TTL)
            .await
            .unwrap();

        let stored = db.get("en : q : results").await.unwrap().unwrap();
        let back: Vec<Row> = serde_json::from_str(&stored).unwrap();
        assert_eq!(back, rows);
    }
}
