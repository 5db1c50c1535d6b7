//! SQLite-backed store for versioned cache generations.
//!
//! This module provides a persistent response store partitioned by version
//! label, using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Request keys derived with SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Atomic generation commits and cascading generation deletes

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
pub use generations::{Generation, GenerationState};
