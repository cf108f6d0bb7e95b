//! Network client for swproxy.
//!
//! This crate provides the reqwest-backed implementation of the core
//! `Network` trait used by the worker for precaching and fetch strategies.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig};
