//! sw_push and sw_notification_click tool implementations.

use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::{HostEffect, Notification, NotificationClick, PushEvent, RecordingHost, ServiceWorker};

use crate::error::json_result;

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Plain text payload of the push message.
    #[serde(default)]
    pub text: Option<String>,
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Action token: "explore" opens the app, "close" only dismisses.
    #[serde(default)]
    pub action: Option<String>,

    /// Title of the clicked notification (default: the configured title).
    #[serde(default)]
    pub title: Option<String>,
}

/// Output from the sw_push tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwPushOutput {
    pub notification: Notification,
    pub effects: Vec<HostEffect>,
}

/// Output from the sw_notification_click tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwNotificationClickOutput {
    /// URL opened or focused, if the action opened the app.
    pub opened: Option<String>,
    pub effects: Vec<HostEffect>,
}

/// Implementation of the sw_push tool.
pub async fn push_impl(
    worker: &ServiceWorker, host: &RecordingHost, params: SwPushParams,
) -> Result<CallToolResult, McpError> {
    let notification = worker.on_push(PushEvent { text: params.text }).await?;
    json_result(&SwPushOutput { notification, effects: host.take_effects() })
}

/// Implementation of the sw_notification_click tool.
pub async fn click_impl(
    worker: &ServiceWorker, host: &RecordingHost, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let title = params
        .title
        .unwrap_or_else(|| worker.config().notification.title.clone());
    let opened = worker
        .on_notification_click(NotificationClick { title, action: params.action })
        .await?;

    json_result(&SwNotificationClickOutput { opened: opened.map(|u| u.to_string()), effects: host.take_effects() })
}
