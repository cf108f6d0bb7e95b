//! Cache generation management: precache on install, garbage-collect on activate.

use std::collections::HashSet;

use futures_util::future::{join_all, try_join_all};
use serde::Serialize;

use super::Inner;
use crate::Error;
use crate::http::Request;

/// Outcome of a successful install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub generation: String,
    /// Resolved URLs now stored in the generation, in precache order.
    pub cached: Vec<String>,
}

/// A stale generation that could not be deleted.
#[derive(Debug, Clone, Serialize)]
pub struct StaleDeletion {
    pub name: String,
    pub reason: String,
}

/// Outcome of an activation.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub current: String,
    pub deleted: Vec<String>,
    pub failed: Vec<StaleDeletion>,
}

impl Inner {
    pub(super) async fn install(&self) -> Result<InstallReport, Error> {
        let name = &self.config.cache_name;
        let requests = self.precache_requests()?;

        tracing::info!(generation = %name, count = requests.len(), "precaching");

        let fetches = requests.iter().map(|request| async move {
            let url = request.url.to_string();
            let response = self
                .network
                .fetch(request)
                .await
                .map_err(|e| Error::PrecacheFailed { url: url.clone(), reason: e.to_string() })?;
            if !response.ok() {
                return Err(Error::PrecacheFailed { url, reason: format!("status {}", response.status()) });
            }
            Ok(response)
        });
        let responses = try_join_all(fetches).await?;

        let cached: Vec<String> = requests.iter().map(|r| r.url.to_string()).collect();
        // put_all creates the generation inside the same atomic write.
        self.caches
            .cache(name)
            .put_all(requests.into_iter().zip(responses).collect())
            .await?;

        tracing::info!(generation = %name, "precache complete");
        self.host.skip_waiting().await;

        Ok(InstallReport { generation: name.clone(), cached })
    }

    fn precache_requests(&self) -> Result<Vec<Request>, Error> {
        let mut seen = HashSet::new();
        let mut requests = Vec::with_capacity(self.config.precache_urls.len());

        for path in &self.config.precache_urls {
            let request = Request::resolve(&self.config.scope, path)
                .map_err(|e| Error::PrecacheFailed { url: path.clone(), reason: e.to_string() })?;
            if !seen.insert(request.url.clone()) {
                return Err(Error::InvalidInput(format!("duplicate precache URL: {}", request.url)));
            }
            requests.push(request);
        }

        Ok(requests)
    }

    pub(super) async fn activate(&self) -> Result<ActivateReport, Error> {
        let current = &self.config.cache_name;
        let stale: Vec<String> = self
            .caches
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != current)
            .collect();

        let outcomes = join_all(stale.iter().map(|name| async move {
            tracing::info!(generation = %name, "deleting stale cache generation");
            (name, self.caches.delete(name).await)
        }))
        .await;

        let mut deleted = Vec::new();
        let mut failed = Vec::new();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(true) => deleted.push(name.clone()),
                Ok(false) => tracing::debug!(generation = %name, "stale generation already gone"),
                Err(e) => {
                    tracing::warn!(generation = %name, error = %e, "failed to delete stale generation");
                    failed.push(StaleDeletion { name: name.clone(), reason: e.to_string() });
                }
            }
        }

        self.host.claim_clients().await;

        Ok(ActivateReport { current: current.clone(), deleted, failed })
    }
}
