//! Scripted collaborators for worker tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use super::{DEFAULT_PRECACHE, ServiceWorker, WorkerConfig};
use crate::Error;
use crate::cache::{CacheStore, CachedResponse, MemoryStore};
use crate::host::RecordingHost;
use crate::http::{Request, Response, ResponseType};
use crate::network::Network;

pub(crate) const SCOPE: &str = "https://app.test/";

#[derive(Clone)]
enum Reply {
    Respond { status: u16, kind: ResponseType, body: &'static str },
    Fail,
}

/// Network that answers from a routing table and records every call.
#[derive(Clone, Default)]
pub(crate) struct StubNetwork {
    routes: Arc<Mutex<HashMap<String, Reply>>>,
    calls: Arc<Mutex<Vec<String>>>,
    offline: Arc<AtomicBool>,
}

impl StubNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Network answering 200 for every default precache URL.
    pub(crate) fn serving_precache() -> Self {
        let network = Self::new();
        for path in DEFAULT_PRECACHE {
            network.route(path, 200, "precached");
        }
        network
    }

    pub(crate) fn request(&self, path: &str) -> Request {
        Request::resolve(&Url::parse(SCOPE).unwrap(), path).unwrap()
    }

    fn key(&self, path: &str) -> String {
        self.request(path).url.to_string()
    }

    pub(crate) fn route(&self, path: &str, status: u16, body: &'static str) {
        self.route_kind(path, status, ResponseType::Basic, body);
    }

    pub(crate) fn route_kind(&self, path: &str, status: u16, kind: ResponseType, body: &'static str) {
        let key = self.key(path);
        self.routes.lock().unwrap().insert(key, Reply::Respond { status, kind, body });
    }

    /// Make `path` fail with a transport error.
    pub(crate) fn fail(&self, path: &str) {
        let key = self.key(path);
        self.routes.lock().unwrap().insert(key, Reply::Fail);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network("offline".into()));
        }

        let reply = self.routes.lock().unwrap().get(&url).cloned();
        match reply {
            Some(Reply::Respond { status, kind, body }) => Ok(Response::new(status, kind, url, body)),
            Some(Reply::Fail) => Err(Error::Network(format!("connection reset: {url}"))),
            None => Err(Error::Network(format!("no route to {url}"))),
        }
    }
}

/// Memory store that can be told to fail deletes and writes.
#[derive(Clone, Default)]
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    undeletable: Arc<Mutex<HashSet<String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    pub(crate) fn new(inner: MemoryStore) -> Self {
        Self { inner, ..Default::default() }
    }

    pub(crate) fn refuse_delete(&self, name: &str) {
        self.undeletable.lock().unwrap().insert(name.to_string());
    }

    pub(crate) fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for FlakyStore {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        self.inner.has(name).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        if self.undeletable.lock().unwrap().contains(name) {
            return Err(Error::CorruptEntry(format!("cannot delete {name}")));
        }
        self.inner.delete(name).await
    }

    async fn get(&self, name: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        self.inner.get(name, key).await
    }

    async fn put(&self, name: &str, key: &str, entry: CachedResponse) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::CorruptEntry("disk full".into()));
        }
        self.inner.put(name, key, entry).await
    }

    async fn put_all(&self, name: &str, entries: Vec<(String, CachedResponse)>) -> Result<(), Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::CorruptEntry("disk full".into()));
        }
        self.inner.put_all(name, entries).await
    }

    async fn entry_keys(&self, name: &str) -> Result<Vec<String>, Error> {
        self.inner.entry_keys(name).await
    }
}

pub(crate) fn config(cache_name: &str) -> WorkerConfig {
    WorkerConfig::new(cache_name, Url::parse(SCOPE).unwrap())
}

pub(crate) fn worker_on<S: CacheStore + Clone + 'static>(
    cache_name: &str, store: &S, network: &StubNetwork, host: &RecordingHost,
) -> ServiceWorker {
    ServiceWorker::new(config(cache_name), Arc::new(store.clone()), Arc::new(network.clone()), Arc::new(host.clone()))
}

pub(crate) fn worker_with(
    cache_name: &str, store: &MemoryStore, network: &StubNetwork, host: &RecordingHost,
) -> ServiceWorker {
    worker_on(cache_name, store, network, host)
}
