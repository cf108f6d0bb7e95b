//! sw_install and sw_activate tool implementations.

use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use serde::Serialize;
use swproxy_core::{ActivateReport, HostEffect, InstallReport, RecordingHost, ServiceWorker, WorkerState};

use crate::error::json_result;

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwInstallOutput {
    pub report: InstallReport,
    pub state: WorkerState,
    /// Platform effects requested while handling the event.
    pub effects: Vec<HostEffect>,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwActivateOutput {
    pub report: ActivateReport,
    pub state: WorkerState,
    pub effects: Vec<HostEffect>,
}

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwStatusOutput {
    pub state: String,
    pub generation: String,
    pub scope: String,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(worker: &ServiceWorker, host: &RecordingHost) -> Result<CallToolResult, McpError> {
    let report = worker.on_install().await?;
    json_result(&SwInstallOutput { report, state: worker.state(), effects: host.take_effects() })
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(worker: &ServiceWorker, host: &RecordingHost) -> Result<CallToolResult, McpError> {
    let report = worker.on_activate().await?;
    json_result(&SwActivateOutput { report, state: worker.state(), effects: host.take_effects() })
}

/// Implementation of the sw_status tool.
pub fn status_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    json_result(&SwStatusOutput {
        state: worker.state().to_string(),
        generation: worker.config().cache_name.clone(),
        scope: worker.config().scope.to_string(),
    })
}
