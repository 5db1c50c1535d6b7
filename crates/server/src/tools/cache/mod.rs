//! Store inspection tools.
//!
//! This module provides read-only views of the generation store.

pub mod generations;
pub mod keys;

pub use generations::generations_impl;
pub use keys::{CacheKeysParams, keys_impl};
