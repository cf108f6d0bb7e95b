//! Core of swproxy: an offline caching policy for a single-page app.
//!
//! This crate provides:
//! - The lifecycle dispatcher (`ServiceWorker`) and its fetch strategies
//! - Cache generations backed by memory or SQLite
//! - Request/response value types with read-once bodies
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod http;
pub mod network;
pub mod worker;

pub use cache::{Cache, CacheStorage, CacheStore, CachedResponse, MemoryStore, SqliteStore};
pub use config::{AppConfig, ConfigError, StoreKind};
pub use error::Error;
pub use host::{Host, HostEffect, RecordingHost};
pub use http::{Method, Request, Response, ResponseSource, ResponseType};
pub use network::Network;
pub use worker::{
    ActivateReport, ExclusionRule, InstallReport, Notification, NotificationClick, NotificationConfig, PushEvent,
    Route, ServiceWorker, WorkerConfig, WorkerState,
};
