//! Platform collaborator: the runtime that hosts the worker.
//!
//! The worker never reaches for ambient globals. Everything it asks of the
//! platform (skip waiting, claim clients, show notifications, open windows)
//! goes through a `Host`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use url::Url;

use crate::Error;
use crate::worker::notification::Notification;

#[async_trait]
pub trait Host: Send + Sync {
    /// Let the freshly installed generation activate without waiting.
    async fn skip_waiting(&self);

    /// Take control of every open client page.
    async fn claim_clients(&self);

    async fn show_notification(&self, notification: &Notification) -> Result<(), Error>;

    async fn close_notification(&self, title: &str);

    /// Open a client window at `url`, or focus one already showing it.
    async fn open_window(&self, url: &Url) -> Result<(), Error>;
}

/// A side effect requested from the host.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum HostEffect {
    SkipWaiting,
    ClaimClients,
    ShowNotification { notification: Notification },
    CloseNotification { title: String },
    OpenWindow { url: String },
}

/// Host that records and logs every effect instead of driving a real UI.
///
/// Notification permission starts granted. While denied, `show_notification`
/// fails and nothing is recorded.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    effects: Arc<Mutex<Vec<HostEffect>>>,
    notifications_denied: Arc<AtomicBool>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant or revoke notification permission.
    pub fn set_notification_permission(&self, granted: bool) {
        self.notifications_denied.store(!granted, Ordering::SeqCst);
    }

    /// Everything recorded so far, oldest first.
    pub fn effects(&self) -> Vec<HostEffect> {
        self.effects.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take_effects(&self) -> Vec<HostEffect> {
        std::mem::take(&mut *self.effects.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn record(&self, effect: HostEffect) {
        tracing::debug!(?effect, "host effect");
        self.effects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(effect);
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn skip_waiting(&self) {
        self.record(HostEffect::SkipWaiting);
    }

    async fn claim_clients(&self) {
        self.record(HostEffect::ClaimClients);
    }

    async fn show_notification(&self, notification: &Notification) -> Result<(), Error> {
        if self.notifications_denied.load(Ordering::SeqCst) {
            return Err(Error::Host(format!("notification permission denied: {}", notification.title)));
        }
        self.record(HostEffect::ShowNotification { notification: notification.clone() });
        Ok(())
    }

    async fn close_notification(&self, title: &str) {
        self.record(HostEffect::CloseNotification { title: title.to_string() });
    }

    async fn open_window(&self, url: &Url) -> Result<(), Error> {
        self.record(HostEffect::OpenWindow { url: url.to_string() });
        Ok(())
    }
}
