//! Push notification payloads.

use serde::{Deserialize, Serialize};

/// Action token that opens the application.
pub const ACTION_EXPLORE: &str = "explore";

/// Action token that only dismisses the notification.
pub const ACTION_CLOSE: &str = "close";

/// Fixed parts of every notification the worker shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_icon")]
    pub icon: String,

    #[serde(default = "default_icon")]
    pub badge: String,

    /// Vibration pattern in milliseconds (vibrate, pause, vibrate, ...).
    #[serde(default = "default_vibrate")]
    pub vibrate: Vec<u32>,

    /// Page opened by the explore action, relative to the scope.
    #[serde(default = "default_open_url")]
    pub open_url: String,

    #[serde(default = "default_explore_title")]
    pub explore_title: String,

    #[serde(default = "default_close_title")]
    pub close_title: String,
}

fn default_title() -> String {
    "Mariangel Calendar".into()
}

fn default_icon() -> String {
    "logo.png".into()
}

fn default_vibrate() -> Vec<u32> {
    vec![200, 100, 200]
}

fn default_open_url() -> String {
    "/".into()
}

fn default_explore_title() -> String {
    "Ver".into()
}

fn default_close_title() -> String {
    "Cerrar".into()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            icon: default_icon(),
            badge: default_icon(),
            vibrate: default_vibrate(),
            open_url: default_open_url(),
            explore_title: default_explore_title(),
            close_title: default_close_title(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

/// A notification ready to be shown by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    /// Build the notification for a push payload arriving now.
    pub fn from_push(config: &NotificationConfig, payload: Option<&str>) -> Self {
        Self::at(config, payload, chrono::Utc::now().timestamp_millis())
    }

    fn at(config: &NotificationConfig, payload: Option<&str>, arrived_ms: i64) -> Self {
        let action = |action: &str, title: &str| NotificationAction {
            action: action.to_string(),
            title: title.to_string(),
            icon: config.icon.clone(),
        };

        Self {
            title: config.title.clone(),
            body: payload.unwrap_or_default().to_string(),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            vibrate: config.vibrate.clone(),
            data: NotificationData { date_of_arrival: arrived_ms, primary_key: 1 },
            actions: vec![
                action(ACTION_EXPLORE, &config.explore_title),
                action(ACTION_CLOSE, &config.close_title),
            ],
        }
    }
}

/// A push message delivered by the platform.
#[derive(Debug, Clone, Default)]
pub struct PushEvent {
    /// Plain text payload, if the push carried one.
    pub text: Option<String>,
}

/// A click on a shown notification or one of its actions.
#[derive(Debug, Clone)]
pub struct NotificationClick {
    /// Title of the clicked notification.
    pub title: String,
    /// Action token; `None` when the notification body itself was clicked.
    pub action: Option<String>,
}

impl NotificationClick {
    pub fn opens_app(&self) -> bool {
        self.action.as_deref() == Some(ACTION_EXPLORE)
    }
}
