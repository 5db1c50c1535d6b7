//! Core types and shared functionality for frost.
//!
//! This crate provides:
//! - Versioned generation store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, Generation, GenerationState, StoredResponse};
pub use config::AppConfig;
pub use error::Error;
