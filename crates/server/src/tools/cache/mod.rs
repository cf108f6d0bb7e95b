//! Cache inspection MCP tools.
//!
//! Read-only views onto the worker's cache generations.

pub mod get;
pub mod keys;

pub use get::{CacheGetParams, get_impl};
pub use keys::{CacheKeysParams, keys_impl};
