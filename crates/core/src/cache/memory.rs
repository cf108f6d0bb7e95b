//! In-memory cache store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStore, CachedResponse};
use crate::Error;

/// Generations kept in creation order, entries keyed by request key.
#[derive(Default)]
struct Generations {
    order: Vec<String>,
    entries: BTreeMap<String, BTreeMap<String, CachedResponse>>,
}

impl Generations {
    fn ensure(&mut self, name: &str) -> &mut BTreeMap<String, CachedResponse> {
        if !self.entries.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.entries.entry(name.to_string()).or_default()
    }
}

/// In-memory store for tests and ephemeral hosts.
///
/// Uses a tokio RwLock so concurrent fetch handlers can read while a
/// background write is pending.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Generations>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.inner.write().await.ensure(name);
        Ok(())
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.inner.read().await.entries.contains_key(name))
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.inner.read().await.order.clone())
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let mut generations = self.inner.write().await;
        if generations.entries.remove(name).is_none() {
            return Ok(false);
        }
        generations.order.retain(|n| n != name);
        Ok(true)
    }

    async fn get(&self, name: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        let generations = self.inner.read().await;
        Ok(generations.entries.get(name).and_then(|g| g.get(key)).cloned())
    }

    async fn put(&self, name: &str, key: &str, entry: CachedResponse) -> Result<(), Error> {
        self.inner.write().await.ensure(name).insert(key.to_string(), entry);
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: Vec<(String, CachedResponse)>) -> Result<(), Error> {
        let mut generations = self.inner.write().await;
        generations.ensure(name).extend(entries);
        Ok(())
    }

    async fn entry_keys(&self, name: &str) -> Result<Vec<String>, Error> {
        let generations = self.inner.read().await;
        Ok(generations
            .entries
            .get(name)
            .map(|g| g.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn match_any(&self, key: &str) -> Result<Option<CachedResponse>, Error> {
        let generations = self.inner.read().await;
        Ok(generations
            .order
            .iter()
            .find_map(|name| generations.entries.get(name).and_then(|g| g.get(key)))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ResponseType;
    use bytes::Bytes;

    fn entry(body: &'static str) -> CachedResponse {
        CachedResponse {
            url: "https://app.test/".into(),
            status: 200,
            kind: ResponseType::Basic,
            headers: Vec::new(),
            body: Bytes::from_static(body.as_bytes()),
            cached_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_keys_in_creation_order() {
        let store = MemoryStore::new();
        store.open("v2").await.unwrap();
        store.open("v1").await.unwrap();
        store.open("v2").await.unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["v2", "v1"]);
    }

    #[tokio::test]
    async fn test_delete_generation() {
        let store = MemoryStore::new();
        store.put("v1", "https://app.test/", entry("a")).await.unwrap();
        assert!(store.has("v1").await.unwrap());

        assert!(store.delete("v1").await.unwrap());
        assert!(!store.delete("v1").await.unwrap());
        assert!(!store.has("v1").await.unwrap());
        assert!(store.keys().await.unwrap().is_empty());
        assert!(store.get("v1", "https://app.test/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_entry() {
        let store = MemoryStore::new();
        store.put("v1", "k", entry("old")).await.unwrap();
        store.put("v1", "k", entry("new")).await.unwrap();
        let got = store.get("v1", "k").await.unwrap().unwrap();
        assert_eq!(got.body, Bytes::from_static(b"new"));
        assert_eq!(store.entry_keys("v1").await.unwrap(), vec!["k"]);
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_generation() {
        let store = MemoryStore::new();
        store.put("v1", "k", entry("first")).await.unwrap();
        store.put("v2", "k", entry("second")).await.unwrap();
        let got = store.match_any("k").await.unwrap().unwrap();
        assert_eq!(got.body, Bytes::from_static(b"first"));
        assert!(store.match_any("missing").await.unwrap().is_none());
    }
}
