//! Fetch strategies.
//!
//! - Network-first: live response wins; any cached copy is a fallback; never writes.
//! - Cache-first: current generation wins; on a miss the network response is
//!   returned and, when cacheable, a copy is written in the background.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::task::JoinSet;

use super::Inner;
use crate::Error;
use crate::http::{Request, Response};

/// Background cache writes that have not been awaited yet.
#[derive(Default)]
pub(crate) struct PendingWrites {
    tasks: Mutex<JoinSet<()>>,
}

impl PendingWrites {
    /// Start `write` without waiting for it. Finished writes are reaped first.
    pub(crate) fn spawn<F>(&self, write: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(done) = tasks.try_join_next() {
            if let Err(e) = done {
                tracing::warn!(error = %e, "background cache write panicked");
            }
        }
        tasks.spawn(write);
    }

    /// Await every write spawned so far, including ones spawned while draining.
    pub(crate) async fn drain(&self) -> usize {
        let mut awaited = 0;
        loop {
            let mut tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
            if tasks.is_empty() {
                return awaited;
            }
            while let Some(done) = tasks.join_next().await {
                if let Err(e) = done {
                    tracing::warn!(error = %e, "background cache write panicked");
                }
                awaited += 1;
            }
        }
    }
}

impl Inner {
    pub(super) async fn network_first(&self, request: &Request) -> Result<Response, Error> {
        let failure = match self.network.fetch(request).await {
            Ok(response) if response.status() < 500 => return Ok(response),
            Ok(response) => Error::HttpError(format!("status {} for {}", response.status(), request.url)),
            Err(e) => e,
        };

        tracing::debug!(url = %request.url, error = %failure, "network-first falling back to cache");

        match self.caches.match_request(request).await {
            Ok(Some(cached)) => Ok(cached),
            Ok(None) => {
                tracing::warn!(url = %request.url, error = %failure, "network failed and no cached copy");
                Err(failure)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache fallback lookup failed");
                Err(failure)
            }
        }
    }

    pub(super) async fn cache_first(&self, request: &Request) -> Result<Response, Error> {
        let name = &self.config.cache_name;

        match self.caches.cache(name).match_request(request).await {
            Ok(Some(hit)) => {
                tracing::debug!(url = %request.url, generation = %name, "cache hit");
                return Ok(hit);
            }
            Ok(None) => tracing::debug!(url = %request.url, generation = %name, "cache miss"),
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed, going to network"),
        }

        let response = self.network.fetch(request).await.inspect_err(|e| {
            tracing::warn!(url = %request.url, error = %e, "fetch failed with no cached copy");
        })?;

        if !response.is_cacheable() || !request.is_cacheable() || self.router.is_excluded(request.url.as_str()) {
            return Ok(response);
        }

        let (response, copy) = response.split();
        let caches = self.caches.clone();
        let name = name.clone();
        let request = request.clone();

        self.pending.spawn(async move {
            let written = match caches.open(&name).await {
                Ok(cache) => cache.put(&request, copy).await,
                Err(e) => Err(e),
            };
            match written {
                Ok(()) => tracing::debug!(url = %request.url, generation = %name, "cached network response"),
                Err(e) => tracing::warn!(url = %request.url, error = %e, "background cache write failed"),
            }
        });

        Ok(response)
    }
}
