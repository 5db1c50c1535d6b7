//! Generation lifecycle operations.
//!
//! A generation is one versioned, complete set of cached resources. It is
//! created while installing, becomes `ready` once every manifest entry has
//! been committed, and is deleted (entries cascade) when superseded.

use super::connection::CacheDb;
use super::entries::{StoredResponse, upsert_entry};
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Install state of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationState {
    /// Opened, but the manifest has not been committed.
    Installing,
    /// The manifest has been committed in full.
    Ready,
}

impl GenerationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationState::Installing => "installing",
            GenerationState::Ready => "ready",
        }
    }

    fn from_db(value: &str) -> Self {
        match value {
            "ready" => GenerationState::Ready,
            _ => GenerationState::Installing,
        }
    }
}

/// Summary of a stored generation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Generation {
    pub version: String,
    pub state: GenerationState,
    pub created_at: String,
    pub installed_at: Option<String>,
    pub activated_at: Option<String>,
    pub entry_count: u64,
}

const SELECT_GENERATION: &str = "SELECT g.version, g.state, g.created_at, g.installed_at, g.activated_at,
        (SELECT COUNT(*) FROM entries e WHERE e.version = g.version)
    FROM generations g";

fn row_to_generation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Generation> {
    let state: String = row.get(1)?;
    Ok(Generation {
        version: row.get(0)?,
        state: GenerationState::from_db(&state),
        created_at: row.get(2)?,
        installed_at: row.get(3)?,
        activated_at: row.get(4)?,
        entry_count: row.get::<_, i64>(5)? as u64,
    })
}

pub(crate) fn insert_generation(conn: &rusqlite::Connection, version: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO generations (version, state, created_at) VALUES (?1, 'installing', ?2)
        ON CONFLICT(version) DO NOTHING",
        params![version, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

impl CacheDb {
    /// Open (creating if absent) the generation for a version label.
    pub async fn open_generation(&self, version: &str) -> Result<(), Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                insert_generation(conn, &version)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a generation summary by version label.
    pub async fn generation(&self, version: &str) -> Result<Option<Generation>, Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Generation>, Error> {
                let sql = format!("{SELECT_GENERATION} WHERE g.version = ?1");
                match conn.query_row(&sql, params![version], row_to_generation) {
                    Ok(generation) => Ok(Some(generation)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List every stored generation, oldest first.
    pub async fn list_generations(&self) -> Result<Vec<Generation>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<Generation>, Error> {
                let sql = format!("{SELECT_GENERATION} ORDER BY g.created_at ASC, g.version ASC");
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], row_to_generation)?;
                let mut generations = Vec::new();
                for row in rows {
                    generations.push(row?);
                }
                Ok(generations)
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a generation has committed its manifest.
    pub async fn is_generation_ready(&self, version: &str) -> Result<bool, Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let ready: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE version = ?1 AND state = 'ready')",
                    params![version],
                    |row| row.get(0),
                )?;
                Ok(ready)
            })
            .await
            .map_err(Error::from)
    }

    /// The generation currently serving open sessions.
    ///
    /// That is the ready generation activated most recently, or None if no
    /// generation has been activated yet.
    pub async fn current_generation(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT version FROM generations
                    WHERE state = 'ready' AND activated_at IS NOT NULL
                    ORDER BY activated_at DESC, rowid DESC
                    LIMIT 1",
                    [],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(version) => Ok(Some(version)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Commit a full manifest for a generation and mark it ready.
    ///
    /// Runs in a single transaction: either every entry is stored and the
    /// generation becomes `ready`, or nothing changes. Re-committing the same
    /// manifest overwrites entries in place.
    pub async fn commit_generation(&self, version: &str, entries: Vec<StoredResponse>) -> Result<u64, Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                insert_generation(&tx, &version)?;
                for entry in &entries {
                    upsert_entry(&tx, &version, entry)?;
                }
                tx.execute(
                    "UPDATE generations SET state = 'ready', installed_at = ?2 WHERE version = ?1",
                    params![version, chrono::Utc::now().to_rfc3339()],
                )?;
                tx.commit()?;
                Ok(entries.len() as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Record that a generation took control of open sessions.
    ///
    /// Returns false if the generation does not exist.
    pub async fn mark_activated(&self, version: &str) -> Result<bool, Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let updated = conn.execute(
                    "UPDATE generations SET activated_at = ?2 WHERE version = ?1",
                    params![version, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(updated > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and every entry stored under it.
    ///
    /// Returns false if the generation did not exist.
    pub async fn delete_generation(&self, version: &str) -> Result<bool, Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE version = ?1", params![version])?;
                let deleted = tx.execute("DELETE FROM generations WHERE version = ?1", params![version])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
