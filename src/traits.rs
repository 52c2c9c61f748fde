//! Core CacheWorker trait

use async_trait::async_trait;

use crate::Result;
use crate::gateway::{ActivateReport, InstallOutcome};
use crate::types::{Request, Response};

/// The lifecycle and request hooks a hosting shim drives.
///
/// Nothing here assumes a dispatch mechanism: an HTTP middleware, an edge
/// adapter or a test calls these methods directly.
#[async_trait]
pub trait CacheWorker: Send + Sync {
    /// Populate the generation for this deployment's version.
    ///
    /// An `Err` means the rollout failed and must be surfaced; the previous
    /// generation keeps serving.
    async fn on_install(&self) -> Result<InstallOutcome>;

    /// Promote the installed generation and drop superseded ones.
    async fn on_activate(&self) -> Result<ActivateReport>;

    /// Answer a request. Never fails.
    async fn intercept(&self, request: &Request) -> Response;
}
