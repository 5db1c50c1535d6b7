//! Stored response operations.
//!
//! Entries are keyed by `(version, request key)`; every read and write names
//! the generation it belongs to, so generations never share a key space.

use super::connection::CacheDb;
use super::generations::insert_generation;
use super::hash::request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A response persisted in a generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    /// Canonical request URL.
    pub url: String,
    pub method: String,
    pub status: u16,
    /// Response type as reported by the transport (`basic`, `cors`, ...).
    pub response_type: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl StoredResponse {
    /// Store key of the request this response answers.
    pub fn key(&self) -> String {
        request_key(&self.method, &self.url)
    }
}

pub(crate) fn upsert_entry(conn: &rusqlite::Connection, version: &str, entry: &StoredResponse) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&entry.headers)?;
    conn.execute(
        "INSERT INTO entries (
            version, key_hash, url, method, status, response_type, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(version, key_hash) DO UPDATE SET
            url = excluded.url,
            method = excluded.method,
            status = excluded.status,
            response_type = excluded.response_type,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            version,
            entry.key(),
            &entry.url,
            &entry.method,
            entry.status as i64,
            &entry.response_type,
            headers_json,
            &entry.body,
            &entry.stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Store a response in a generation, opening the generation if needed.
    ///
    /// Uses UPSERT semantics on the request key.
    pub async fn put_entry(&self, version: &str, entry: &StoredResponse) -> Result<(), Error> {
        let version = version.to_string();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                insert_generation(conn, &version)?;
                upsert_entry(conn, &version, &entry)
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a stored response by request method and canonical URL.
    ///
    /// Returns None if the generation holds no entry for the request.
    pub async fn get_entry(&self, version: &str, method: &str, url: &str) -> Result<Option<StoredResponse>, Error> {
        let version = version.to_string();
        let key = request_key(method, url);
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, method, status, response_type, headers_json, body, stored_at
                    FROM entries WHERE version = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![version, key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Vec<u8>>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                });

                match result {
                    Ok((url, method, status, response_type, headers_json, body, stored_at)) => {
                        let headers = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::InvalidInput(format!("corrupt headers for {url}: {e}")))?;
                        Ok(Some(StoredResponse {
                            url,
                            method,
                            status: status as u16,
                            response_type,
                            headers,
                            body,
                            stored_at,
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List the request URLs stored in a generation.
    ///
    /// Returns an empty list for unknown or deleted generations.
    pub async fn keys(&self, version: &str) -> Result<Vec<String>, Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE version = ?1 ORDER BY url ASC")?;
                let rows = stmt.query_map(params![version], |row| row.get::<_, String>(0))?;
                let mut urls = Vec::new();
                for row in rows {
                    urls.push(row?);
                }
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(url: &str, body: &[u8]) -> StoredResponse {
        StoredResponse {
            url: url.to_string(),
            method: "GET".to_string(),
            status: 200,
            response_type: "basic".to_string(),
            headers: vec![("content-type".to_string(), "application/javascript".to_string())],
            body: body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entry = make_entry("http://localhost:8080/js/app.js", b"init()");

        db.put_entry("v1", &entry).await.unwrap();

        let retrieved = db
            .get_entry("v1", "GET", "http://localhost:8080/js/app.js")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved, entry);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get_entry("v1", "GET", "http://localhost:8080/").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_generations_are_partitioned() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("v1", &make_entry("http://localhost:8080/", b"old")).await.unwrap();

        let other = db.get_entry("v2", "GET", "http://localhost:8080/").await.unwrap();
        assert!(other.is_none());
        assert!(db.keys("v2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_opens_generation_without_marking_ready() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("v1", &make_entry("http://localhost:8080/", b"x")).await.unwrap();

        assert!(db.generation("v1").await.unwrap().is_some());
        assert!(!db.is_generation_ready("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_replaces_body() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("v1", &make_entry("http://localhost:8080/", b"first")).await.unwrap();
        db.put_entry("v1", &make_entry("http://localhost:8080/", b"second")).await.unwrap();

        let entry = db.get_entry("v1", "GET", "http://localhost:8080/").await.unwrap().unwrap();
        assert_eq!(entry.body, b"second".to_vec());
        assert_eq!(db.keys("v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_keys_sorted() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("v1", &make_entry("http://localhost:8080/b.js", b"b")).await.unwrap();
        db.put_entry("v1", &make_entry("http://localhost:8080/a.js", b"a")).await.unwrap();

        let keys = db.keys("v1").await.unwrap();
        assert_eq!(keys, vec!["http://localhost:8080/a.js".to_string(), "http://localhost:8080/b.js".to_string()]);
    }
}
