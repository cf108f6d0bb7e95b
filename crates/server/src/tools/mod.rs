//! MCP tool implementations.
//!
//! Each tool delivers one platform event (or one cache inspection) to the
//! worker and reports the outcome as JSON.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod notify;
