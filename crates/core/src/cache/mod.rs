//! Named cache generations and the stores that back them.
//!
//! This module provides the response cache the worker populates and serves
//! from. It supports:
//!
//! - A `CacheStore` trait with in-memory and SQLite backends
//! - `CacheStorage` / `Cache` handles that speak `Request` and `Response`
//! - Whole-generation deletion (no per-entry eviction)
//! - Atomic batch writes for precaching

pub mod connection;
pub mod hash;
pub mod memory;
pub mod migrations;

pub use crate::Error;

pub use connection::SqliteStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::http::{Request, Response, ResponseSource, ResponseType};

/// Stored form of a response inside a cache generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub kind: ResponseType,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub cached_at: String,
}

impl CachedResponse {
    /// Consume a response into its stored form.
    pub fn from_response(response: Response) -> Self {
        let (status, kind, url, headers, body) = response.into_parts();
        Self { url, status, kind, headers, body, cached_at: chrono::Utc::now().to_rfc3339() }
    }

    /// A fresh readable response for this entry.
    pub fn to_response(&self) -> Response {
        Response::new(self.status, self.kind, self.url.clone(), self.body.clone())
            .with_headers(self.headers.clone())
            .with_source(ResponseSource::Cache)
    }
}

/// Key-value storage of cache generations.
///
/// Generations are addressed by name, entries by request key. Implementations
/// rely on their own atomicity for single `get`/`put`/`delete` calls; callers
/// never lock around them.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the generation if it does not exist yet.
    async fn open(&self, name: &str) -> Result<(), Error>;

    async fn has(&self, name: &str) -> Result<bool, Error>;

    /// Generation names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a whole generation. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    async fn get(&self, name: &str, key: &str) -> Result<Option<CachedResponse>, Error>;

    /// Insert or replace an entry, creating the generation if needed.
    async fn put(&self, name: &str, key: &str, entry: CachedResponse) -> Result<(), Error>;

    /// Write several entries so that either all or none become visible.
    async fn put_all(&self, name: &str, entries: Vec<(String, CachedResponse)>) -> Result<(), Error>;

    /// Entry keys of one generation, sorted.
    async fn entry_keys(&self, name: &str) -> Result<Vec<String>, Error>;

    /// First match for `key` across all generations, oldest generation first.
    async fn match_any(&self, key: &str) -> Result<Option<CachedResponse>, Error> {
        for name in self.keys().await? {
            if let Some(entry) = self.get(&name, key).await? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}

/// Entry point onto all generations of a store.
#[derive(Clone)]
pub struct CacheStorage {
    store: Arc<dyn CacheStore>,
}

impl CacheStorage {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Open (creating if absent) the named generation.
    pub async fn open(&self, name: &str) -> Result<Cache, Error> {
        self.store.open(name).await?;
        Ok(Cache { store: Arc::clone(&self.store), name: name.to_string() })
    }

    /// Handle onto `name` without creating it; lookups on a missing generation miss.
    pub fn cache(&self, name: &str) -> Cache {
        Cache { store: Arc::clone(&self.store), name: name.to_string() }
    }

    pub async fn has(&self, name: &str) -> Result<bool, Error> {
        self.store.has(name).await
    }

    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.store.keys().await
    }

    pub async fn delete(&self, name: &str) -> Result<bool, Error> {
        self.store.delete(name).await
    }

    /// Look the request up in every generation.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_cacheable() {
            return Ok(None);
        }
        let entry = self.store.match_any(request.cache_key()).await?;
        Ok(entry.map(|e| e.to_response()))
    }
}

/// Handle onto one named generation.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    name: String,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Cache {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_cacheable() {
            return Ok(None);
        }
        let entry = self.store.get(&self.name, request.cache_key()).await?;
        Ok(entry.map(|e| e.to_response()))
    }

    /// Store `response` under `request`. Only GET requests can be stored.
    pub async fn put(&self, request: &Request, response: Response) -> Result<(), Error> {
        if !request.is_cacheable() {
            return Err(Error::InvalidInput(format!("{} requests cannot be cached", request.method)));
        }
        self.store
            .put(&self.name, request.cache_key(), CachedResponse::from_response(response))
            .await
    }

    /// Store every pair or none of them.
    pub async fn put_all(&self, pairs: Vec<(Request, Response)>) -> Result<(), Error> {
        let mut entries = Vec::with_capacity(pairs.len());
        for (request, response) in pairs {
            if !request.is_cacheable() {
                return Err(Error::InvalidInput(format!("{} requests cannot be cached", request.method)));
            }
            entries.push((request.cache_key().to_string(), CachedResponse::from_response(response)));
        }
        self.store.put_all(&self.name, entries).await
    }

    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.store.entry_keys(&self.name).await
    }
}
