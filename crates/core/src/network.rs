//! Network collaborator used by the fetch strategies and precaching.

use async_trait::async_trait;

use crate::Error;
use crate::http::{Request, Response};

/// Performs a real (or simulated) network fetch.
///
/// Non-success statuses come back as `Ok`; only transport failures are errors.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}
