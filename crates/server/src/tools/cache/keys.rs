//! cache_keys tool implementation.
//!
//! Lists cache generations, or the entry keys of one generation.

use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swproxy_core::{Error, ServiceWorker};

use crate::error::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Generation whose entries to list. Omit to list generation names only.
    #[serde(default)]
    pub generation: Option<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheKeysOutput {
    /// Generation names in creation order.
    pub generations: Vec<String>,
    /// Generation the worker currently writes to.
    pub current: String,
    /// Entry keys of the requested generation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<String>>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(worker: &ServiceWorker, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let caches = worker.caches();
    let generations = caches.keys().await?;

    let entries = match params.generation {
        Some(name) if !generations.contains(&name) => {
            return Err(Error::CacheMiss(format!("no generation named {name}")).into());
        }
        Some(name) => Some(caches.cache(&name).keys().await?),
        None => None,
    };

    json_result(&CacheKeysOutput { generations, current: worker.config().cache_name.clone(), entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{text_of, worker};
    use swproxy_core::CacheStore;

    #[tokio::test]
    async fn test_keys_impl_lists_generations() {
        let (worker, _host, store) = worker(&[]);
        store.open("app-v0").await.unwrap();
        store.open("app-v1").await.unwrap();

        let output = text_of(&keys_impl(&worker, CacheKeysParams::default()).await.unwrap());
        assert_eq!(output["generations"], serde_json::json!(["app-v0", "app-v1"]));
        assert_eq!(output["current"], "app-v1");
        assert!(output.get("entries").is_none());
    }

    #[tokio::test]
    async fn test_keys_impl_lists_entries() {
        let (worker, _host, _store) = worker(&[("/style.css", 200, "body {}")]);
        let request = swproxy_core::Request::resolve(&worker.config().scope, "/style.css").unwrap();
        worker.on_fetch(request).await.unwrap();
        worker.drain_pending_writes().await;

        let params = CacheKeysParams { generation: Some("app-v1".into()) };
        let output = text_of(&keys_impl(&worker, params).await.unwrap());
        assert_eq!(output["entries"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_keys_impl_unknown_generation() {
        let (worker, _host, _store) = worker(&[]);
        let params = CacheKeysParams { generation: Some("nope".into()) };
        let err = keys_impl(&worker, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }
}
