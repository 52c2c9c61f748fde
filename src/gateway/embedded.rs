//! EmbeddedCache - in-process CacheWorker

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::interceptor::RequestInterceptor;
use super::lifecycle::{ActivateReport, GenerationManager, InstallOutcome};
use super::routing::PolicyClassifier;
use crate::cache::{CacheService, ExpiryScanner};
use crate::types::{Request, Response};
use crate::{CacheWorker, Result};

/// All components wired around one [`CacheService`].
pub struct EmbeddedCache {
    service: Arc<CacheService>,
    interceptor: RequestInterceptor,
    lifecycle: GenerationManager,
    scanner: Arc<ExpiryScanner>,
}

impl EmbeddedCache {
    pub(crate) fn new(
        service: Arc<CacheService>,
        interceptor: RequestInterceptor,
        lifecycle: GenerationManager,
        scanner: Arc<ExpiryScanner>,
    ) -> Self {
        Self {
            service,
            interceptor,
            lifecycle,
            scanner,
        }
    }

    pub fn service(&self) -> &Arc<CacheService> {
        &self.service
    }

    pub fn classifier(&self) -> &PolicyClassifier {
        self.interceptor.classifier()
    }

    pub fn interceptor(&self) -> &RequestInterceptor {
        &self.interceptor
    }

    pub fn lifecycle(&self) -> &GenerationManager {
        &self.lifecycle
    }

    pub fn scanner(&self) -> &Arc<ExpiryScanner> {
        &self.scanner
    }

    /// Start the periodic expiry sweep. Abort the handle to stop it.
    pub fn spawn_expiry(&self) -> JoinHandle<()> {
        self.scanner.clone().spawn()
    }
}

#[async_trait]
impl CacheWorker for EmbeddedCache {
    async fn on_install(&self) -> Result<InstallOutcome> {
        self.lifecycle.install().await
    }

    async fn on_activate(&self) -> Result<ActivateReport> {
        self.lifecycle.activate().await
    }

    async fn intercept(&self, request: &Request) -> Response {
        self.interceptor.intercept(request).await
    }
}

impl std::fmt::Debug for EmbeddedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedCache")
            .field("generation", &self.lifecycle.generation_name())
            .field("current", &self.service.current_name())
            .finish()
    }
}
