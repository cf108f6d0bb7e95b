//! The worker: one dispatcher object with a method per lifecycle event.
//!
//! ### Lifecycle
//! - `on_install`: precache every configured URL into the current generation,
//!   all or nothing, then ask the host to skip waiting.
//! - `on_activate`: delete every generation whose name is not the current one,
//!   then claim open clients.
//! - `on_fetch`: classify the URL and hand it to network-first or cache-first.
//! - `on_push` / `on_notification_click`: show notifications and open the app.
//!
//! ### Concurrency
//! - `ServiceWorker` is cheap to clone; every fetch runs as its own task.
//! - The cache store is the only shared mutable state and is never locked here.
//! - Opportunistic cache writes are detached tasks; `drain_pending_writes`
//!   waits for them.

pub mod generation;
pub mod notification;
pub mod router;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use url::Url;

use crate::Error;
use crate::cache::{CacheStorage, CacheStore};
use crate::host::Host;
use crate::http::{Request, Response};
use crate::network::Network;

pub use generation::{ActivateReport, InstallReport, StaleDeletion};
pub use notification::{Notification, NotificationClick, NotificationConfig, PushEvent};
pub use router::{ExclusionRule, Route, Router};
use strategy::PendingWrites;

/// Precache list used when none is configured.
pub const DEFAULT_PRECACHE: &[&str] = &["/", "/manifest.json", "logo.png", "/index.html"];

/// Lifecycle states of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Constructed, no lifecycle event handled yet.
    Parsed,
    Installing,
    /// Precache complete; eligible for activation.
    Installed,
    Activating,
    /// Stale generations removed; serving fetches.
    Activated,
    /// Install failed; this generation will never be promoted.
    Redundant,
}

impl WorkerState {
    /// Whether the lifecycle allows moving from `self` to `to`.
    ///
    /// Install runs once per worker and activation requires a completed
    /// install, so a redundant worker can never activate.
    pub fn can_transition_to(self, to: WorkerState) -> bool {
        use WorkerState::*;

        matches!(
            (self, to),
            (Parsed, Installing)
                | (Installing, Installed)
                | (Installing, Redundant)
                | (Installed, Activating)
                | (Activating, Activated)
                | (Activating, Redundant)
        )
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// Policy inputs for one deployed version of the worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name of the current cache generation; bumping it invalidates everything.
    pub cache_name: String,
    /// Base URL requests and precache paths resolve against.
    pub scope: Url,
    pub precache_urls: Vec<String>,
    pub exclusion: ExclusionRule,
    pub notification: NotificationConfig,
}

impl WorkerConfig {
    /// Config with the default precache list, `/album/` exclusion and notification assets.
    pub fn new(cache_name: impl Into<String>, scope: Url) -> Self {
        Self {
            cache_name: cache_name.into(),
            scope,
            precache_urls: DEFAULT_PRECACHE.iter().map(|s| s.to_string()).collect(),
            exclusion: ExclusionRule::default(),
            notification: NotificationConfig::default(),
        }
    }
}

pub(crate) struct Inner {
    pub(crate) config: WorkerConfig,
    pub(crate) router: Router,
    pub(crate) caches: CacheStorage,
    pub(crate) network: Arc<dyn Network>,
    pub(crate) host: Arc<dyn Host>,
    pub(crate) pending: PendingWrites,
    state: Mutex<WorkerState>,
}

impl Inner {
    /// Move to `to`, rejecting transitions the lifecycle does not allow.
    fn transition(&self, to: WorkerState) -> Result<(), Error> {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !current.can_transition_to(to) {
            tracing::warn!(generation = %self.config.cache_name, from = %*current, to = %to, "rejected state change");
            return Err(Error::InvalidState(format!("{} -> {}", *current, to)));
        }
        tracing::info!(generation = %self.config.cache_name, from = %*current, to = %to, "worker state change");
        *current = to;
        Ok(())
    }
}

/// Dispatcher for platform lifecycle events.
#[derive(Clone)]
pub struct ServiceWorker {
    inner: Arc<Inner>,
}

impl ServiceWorker {
    pub fn new(
        config: WorkerConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Network>, host: Arc<dyn Host>,
    ) -> Self {
        let router = Router::new(config.exclusion.clone());
        Self {
            inner: Arc::new(Inner {
                config,
                router,
                caches: CacheStorage::new(store),
                network,
                host,
                pending: PendingWrites::default(),
                state: Mutex::new(WorkerState::Parsed),
            }),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.inner.config
    }

    pub fn caches(&self) -> &CacheStorage {
        &self.inner.caches
    }

    pub fn state(&self) -> WorkerState {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route a request would take, without performing it.
    pub fn classify(&self, request: &Request) -> Route {
        self.inner.router.classify(request)
    }

    /// Handle the install event.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless the worker is freshly parsed.
    ///
    /// Returns `Error::PrecacheFailed` if any precache URL fails to fetch or
    /// answers with a non-ok status. Nothing is written in that case and the
    /// worker becomes redundant.
    pub async fn on_install(&self) -> Result<InstallReport, Error> {
        self.inner.transition(WorkerState::Installing)?;
        match self.inner.install().await {
            Ok(report) => {
                self.inner.transition(WorkerState::Installed)?;
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(generation = %self.inner.config.cache_name, error = %e, "install failed");
                self.inner.transition(WorkerState::Redundant)?;
                Err(e)
            }
        }
    }

    /// Handle the activate event.
    ///
    /// Failures to delete individual stale generations are reported in the
    /// returned `ActivateReport`, never as an error.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless install completed; a redundant
    /// worker never deletes anything. Otherwise errors only if the store
    /// cannot list its generations, which also makes the worker redundant.
    pub async fn on_activate(&self) -> Result<ActivateReport, Error> {
        self.inner.transition(WorkerState::Activating)?;
        match self.inner.activate().await {
            Ok(report) => {
                self.inner.transition(WorkerState::Activated)?;
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(generation = %self.inner.config.cache_name, error = %e, "activate failed");
                self.inner.transition(WorkerState::Redundant)?;
                Err(e)
            }
        }
    }

    /// Handle a fetch event.
    ///
    /// # Errors
    ///
    /// Network-first: the network failure when no cached copy exists.
    /// Cache-first: the network failure on a miss.
    pub async fn on_fetch(&self, request: Request) -> Result<Response, Error> {
        match self.inner.router.classify(&request) {
            Route::NetworkFirst => self.inner.network_first(&request).await,
            Route::CacheFirst => self.inner.cache_first(&request).await,
        }
    }

    /// Handle a push event by showing a notification built from its payload.
    pub async fn on_push(&self, event: PushEvent) -> Result<Notification, Error> {
        let notification = Notification::from_push(&self.inner.config.notification, event.text.as_deref());
        tracing::info!(title = %notification.title, "showing push notification");
        self.inner.host.show_notification(&notification).await?;
        Ok(notification)
    }

    /// Handle a notification click. Returns the URL opened, if any.
    pub async fn on_notification_click(&self, click: NotificationClick) -> Result<Option<Url>, Error> {
        self.inner.host.close_notification(&click.title).await;

        if !click.opens_app() {
            return Ok(None);
        }

        let url = Request::resolve(&self.inner.config.scope, &self.inner.config.notification.open_url)?.url;
        self.inner.host.open_window(&url).await?;
        Ok(Some(url))
    }

    /// Wait for every background cache write started so far.
    ///
    /// Returns the number of writes awaited.
    pub async fn drain_pending_writes(&self) -> usize {
        self.inner.pending.drain().await
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{StubNetwork, worker_on, worker_with};
    use super::*;
    use crate::cache::{MemoryStore, SqliteStore};
    use crate::host::{HostEffect, RecordingHost};
    use crate::http::ResponseSource;

    #[tokio::test]
    async fn test_full_lifecycle() {
        let network = StubNetwork::serving_precache();
        network.route("/style.css", 200, "body {}");
        let store = MemoryStore::new();
        let host = RecordingHost::new();
        let worker = worker_with("app-v1", &store, &network, &host);

        assert_eq!(worker.state(), WorkerState::Parsed);
        worker.on_install().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Installed);
        worker.on_activate().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Activated);

        let response = worker.on_fetch(network.request("/style.css")).await.unwrap();
        assert_eq!(response.source(), ResponseSource::Network);
        worker.drain_pending_writes().await;

        let response = worker.on_fetch(network.request("/index.html")).await.unwrap();
        assert_eq!(response.source(), ResponseSource::Cache);

        assert_eq!(host.effects(), vec![HostEffect::SkipWaiting, HostEffect::ClaimClients]);
    }

    #[tokio::test]
    async fn test_failed_install_marks_redundant() {
        let network = StubNetwork::new();
        let worker = worker_with("app-v1", &MemoryStore::new(), &network, &RecordingHost::new());

        assert!(worker.on_install().await.is_err());
        assert_eq!(worker.state(), WorkerState::Redundant);
    }

    #[tokio::test]
    async fn test_activate_after_failed_install_keeps_previous_generation() {
        let store = MemoryStore::new();
        let host = RecordingHost::new();
        let v1 = worker_with("app-v1", &store, &StubNetwork::serving_precache(), &host);
        v1.on_install().await.unwrap();
        v1.on_activate().await.unwrap();
        host.take_effects();

        let v2 = worker_with("app-v2", &store, &StubNetwork::new(), &host);
        assert!(v2.on_install().await.is_err());

        let err = v2.on_activate().await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(v2.state(), WorkerState::Redundant);
        assert_eq!(store.keys().await.unwrap(), vec!["app-v1"]);
        assert_eq!(store.entry_keys("app-v1").await.unwrap().len(), 4);
        assert!(host.effects().is_empty());
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let store = MemoryStore::new();
        store.open("app-v0").await.unwrap();
        let host = RecordingHost::new();
        let worker = worker_with("app-v1", &store, &StubNetwork::serving_precache(), &host);

        assert!(matches!(worker.on_activate().await, Err(Error::InvalidState(_))));
        assert_eq!(worker.state(), WorkerState::Parsed);
        assert_eq!(store.keys().await.unwrap(), vec!["app-v0"]);
        assert!(host.effects().is_empty());
    }

    #[tokio::test]
    async fn test_install_and_activate_run_once() {
        let worker = worker_with("app-v1", &MemoryStore::new(), &StubNetwork::serving_precache(), &RecordingHost::new());
        worker.on_install().await.unwrap();
        assert!(matches!(worker.on_install().await, Err(Error::InvalidState(_))));
        assert_eq!(worker.state(), WorkerState::Installed);

        worker.on_activate().await.unwrap();
        assert!(matches!(worker.on_activate().await, Err(Error::InvalidState(_))));
        assert_eq!(worker.state(), WorkerState::Activated);
    }

    #[test]
    fn test_state_transitions() {
        use WorkerState::*;

        assert!(Parsed.can_transition_to(Installing));
        assert!(Installing.can_transition_to(Redundant));
        assert!(Installed.can_transition_to(Activating));
        assert!(Activating.can_transition_to(Activated));

        assert!(!Parsed.can_transition_to(Activating));
        assert!(!Redundant.can_transition_to(Activating));
        assert!(!Redundant.can_transition_to(Installing));
        assert!(!Activated.can_transition_to(Installing));
    }

    #[tokio::test]
    async fn test_full_lifecycle_on_sqlite() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.open("app-v0").await.unwrap();
        let network = StubNetwork::serving_precache();
        network.route("/style.css", 200, "body {}");
        let host = RecordingHost::new();
        let worker = worker_on("app-v1", &store, &network, &host);

        let report = worker.on_install().await.unwrap();
        assert_eq!(store.entry_keys("app-v1").await.unwrap().len(), report.cached.len());

        let report = worker.on_activate().await.unwrap();
        assert_eq!(report.deleted, vec!["app-v0"]);
        assert_eq!(store.keys().await.unwrap(), vec!["app-v1"]);

        let response = worker.on_fetch(network.request("/style.css")).await.unwrap();
        assert_eq!(response.source(), ResponseSource::Network);
        assert_eq!(worker.drain_pending_writes().await, 1);

        network.set_offline(true);
        let response = worker.on_fetch(network.request("/style.css")).await.unwrap();
        assert_eq!(response.source(), ResponseSource::Cache);
        assert_eq!(response.text(), "body {}");

        let precached = worker.on_fetch(network.request("/manifest.json")).await.unwrap();
        assert_eq!(precached.source(), ResponseSource::Cache);
    }

    #[tokio::test]
    async fn test_push_without_permission_fails() {
        let host = RecordingHost::new();
        host.set_notification_permission(false);
        let worker = worker_with("app-v1", &MemoryStore::new(), &StubNetwork::new(), &host);

        let err = worker.on_push(PushEvent { text: Some("Tickets on sale".into()) }).await.unwrap_err();
        assert!(matches!(err, Error::Host(_)));
        assert!(host.effects().is_empty());
    }

    #[tokio::test]
    async fn test_push_shows_notification() {
        let host = RecordingHost::new();
        let worker = worker_with("app-v1", &MemoryStore::new(), &StubNetwork::new(), &host);

        let shown = worker
            .on_push(PushEvent { text: Some("Tickets on sale".into()) })
            .await
            .unwrap();
        assert_eq!(shown.body, "Tickets on sale");
        assert_eq!(host.effects(), vec![HostEffect::ShowNotification { notification: shown }]);
    }

    #[tokio::test]
    async fn test_explore_click_opens_root() {
        let host = RecordingHost::new();
        let worker = worker_with("app-v1", &MemoryStore::new(), &StubNetwork::new(), &host);

        let click = NotificationClick { title: "Mariangel Calendar".into(), action: Some("explore".into()) };
        let opened = worker.on_notification_click(click).await.unwrap();

        assert_eq!(opened.unwrap().as_str(), "https://app.test/");
        assert_eq!(
            host.effects(),
            vec![
                HostEffect::CloseNotification { title: "Mariangel Calendar".into() },
                HostEffect::OpenWindow { url: "https://app.test/".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_close_click_only_closes() {
        let host = RecordingHost::new();
        let worker = worker_with("app-v1", &MemoryStore::new(), &StubNetwork::new(), &host);

        let click = NotificationClick { title: "Mariangel Calendar".into(), action: Some("close".into()) };
        assert!(worker.on_notification_click(click).await.unwrap().is_none());

        let click = NotificationClick { title: "Mariangel Calendar".into(), action: None };
        assert!(worker.on_notification_click(click).await.unwrap().is_none());

        assert!(
            host.effects()
                .iter()
                .all(|e| matches!(e, HostEffect::CloseNotification { .. }))
        );
        assert_eq!(host.effects().len(), 2);
    }

    #[test]
    fn test_worker_config_defaults() {
        let config = WorkerConfig::new("app-v1", Url::parse("https://app.test/").unwrap());
        assert_eq!(config.precache_urls, vec!["/", "/manifest.json", "logo.png", "/index.html"]);
        assert!(config.exclusion.matches("https://app.test/album/1.jpg"));
    }
}
