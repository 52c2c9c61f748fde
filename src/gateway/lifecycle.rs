//! Cache generation lifecycle: install and activate.
//!
//! # Install
//!
//! Fetches the whole manifest into a staged generation named
//! `{prefix}-{version}`. Every shell entry must come back as a cacheable
//! `200`; a single failure discards the staged generation and reports
//! [`HoardError::ManifestFetch`], leaving the current generation serving.
//! Media entries are fetched too but only logged on failure. On success the
//! staged generation is committed and marked pending, and the outcome asks
//! the host to activate right away instead of waiting for existing clients.
//!
//! Installing a version that is already pending or current is a no-op.
//!
//! # Activate
//!
//! Promotes this manager's pending generation to current (all handlers on
//! the shared [`CacheService`] switch on their next lookup), then deletes
//! every generation that is neither current nor pending from a later install.
//!
//! Install and activate hold the service-wide lifecycle lock, so overlapping
//! redeploys against one service run one after the other and never see each
//! other's half-built state.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures_util::stream::{self, StreamExt};
use reqwest::{Method, Url};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::{CacheService, Generation};
use crate::network::{Fetcher, fetch_with_timeout};
use crate::telemetry;
use crate::types::{Manifest, Request, Response, StoredResponse};
use crate::{HoardError, Result};

/// Default number of manifest fetches in flight during install.
pub const DEFAULT_INSTALL_CONCURRENCY: usize = 6;

/// Generation name for a deployment: `{prefix}-{version}`.
pub fn generation_name(prefix: &str, version: &str) -> String {
    format!("{prefix}-{version}")
}

/// Version tag of a generation named under `prefix`, if it is one.
pub fn version_of<'a>(prefix: &str, name: &'a str) -> Option<&'a str> {
    name.strip_prefix(prefix)?
        .strip_prefix('-')
        .filter(|v| !v.is_empty())
}

/// Result of [`GenerationManager::install`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstallOutcome {
    /// A new generation was populated and is pending activation.
    Installed {
        generation: String,
        entries: usize,
        media_failures: usize,
        /// Activate immediately rather than waiting for clients to release
        /// the previous generation.
        skip_waiting: bool,
    },
    /// This version is already pending or current; nothing changed.
    AlreadyInstalled { generation: String },
}

impl InstallOutcome {
    pub fn generation(&self) -> &str {
        match self {
            InstallOutcome::Installed { generation, .. }
            | InstallOutcome::AlreadyInstalled { generation } => generation,
        }
    }

    pub fn skip_waiting(&self) -> bool {
        matches!(
            self,
            InstallOutcome::Installed {
                skip_waiting: true,
                ..
            }
        )
    }
}

/// Result of [`GenerationManager::activate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    /// Generation now serving all clients.
    pub current: String,
    /// Superseded generations removed.
    pub deleted: Vec<String>,
}

/// Owns creation, promotion and deletion of cache generations.
pub struct GenerationManager {
    service: Arc<CacheService>,
    fetcher: Arc<dyn Fetcher>,
    origin: Url,
    manifest: Manifest,
    prefix: String,
    version: String,
    timeout: Duration,
    concurrency: usize,
}

impl GenerationManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        service: Arc<CacheService>,
        fetcher: Arc<dyn Fetcher>,
        origin: Url,
        manifest: Manifest,
        prefix: impl Into<String>,
        version: impl Into<String>,
        timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            service,
            fetcher,
            origin,
            manifest,
            prefix: prefix.into(),
            version: version.into(),
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Name of the generation this manager installs.
    pub fn generation_name(&self) -> String {
        generation_name(&self.prefix, &self.version)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Whether this manager's generation is installed but not yet active.
    pub async fn is_pending(&self) -> bool {
        self.service.lifecycle().await.is_pending(&self.generation_name())
    }

    /// Populate a new generation from the manifest.
    #[instrument(skip(self), fields(generation = %self.generation_name()))]
    pub async fn install(&self) -> Result<InstallOutcome> {
        let mut lifecycle = self.service.lifecycle().await;
        let name = self.generation_name();

        let already = lifecycle.is_pending(&name)
            || self.service.current_name().as_deref() == Some(name.as_str());
        if already {
            info!("version already installed");
            metrics::counter!(telemetry::INSTALLS_TOTAL, "outcome" => "noop").increment(1);
            return Ok(InstallOutcome::AlreadyInstalled { generation: name });
        }

        match self.populate(&name).await {
            Ok((staged, media_failures)) => {
                let entries = staged.len();
                self.service.storage().commit(staged).await?;
                lifecycle.mark_pending(&name);
                info!(entries, media_failures, "generation installed");
                metrics::counter!(telemetry::INSTALLS_TOTAL, "outcome" => "installed").increment(1);
                Ok(InstallOutcome::Installed {
                    generation: name,
                    entries,
                    media_failures,
                    skip_waiting: true,
                })
            }
            Err(e) => {
                error!(error = %e, "install failed; previous generation keeps serving");
                metrics::counter!(telemetry::INSTALLS_TOTAL, "outcome" => "failed").increment(1);
                Err(e)
            }
        }
    }

    /// Promote this manager's pending generation and delete the superseded
    /// ones.
    ///
    /// Without a pending install, re-runs cleanup around whatever is current.
    #[instrument(skip(self), fields(generation = %self.generation_name()))]
    pub async fn activate(&self) -> Result<ActivateReport> {
        let mut lifecycle = self.service.lifecycle().await;
        let own = self.generation_name();
        let current = if lifecycle.take_pending(&own) {
            own
        } else {
            self.service
                .current_name()
                .ok_or(HoardError::NoActiveGeneration)?
        };

        let storage = self.service.storage();
        if !storage.has(&current).await? {
            return Err(HoardError::StoreUnavailable(format!(
                "generation {current} vanished before activation"
            )));
        }
        self.service.promote(&current);

        let mut deleted = Vec::new();
        for name in storage.keys().await? {
            if name == current {
                continue;
            }
            if lifecycle.is_pending(&name) {
                debug!(generation = %name, "keeping generation awaiting activation");
                continue;
            }
            if storage.delete(&name).await? {
                let version = version_of(&self.prefix, &name).unwrap_or("foreign");
                info!(generation = %name, version, "removed superseded generation");
                deleted.push(name);
            }
        }
        metrics::counter!(telemetry::GENERATIONS_DELETED_TOTAL).increment(deleted.len() as u64);
        info!(generation = %current, deleted = deleted.len(), "generation active");

        Ok(ActivateReport { current, deleted })
    }

    /// Fetch the manifest into a staged generation that nobody can see yet.
    async fn populate(&self, name: &str) -> Result<(Arc<Generation>, usize)> {
        let resolved = self.manifest.resolve(&self.origin)?;
        let staged = Arc::new(Generation::new(name));

        for (url, result) in self.fetch_all(resolved.shell).await {
            let response = result.map_err(|e| HoardError::ManifestFetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            if !response.is_cacheable() {
                return Err(HoardError::ManifestFetch {
                    url: url.to_string(),
                    reason: rejection_reason(&response),
                });
            }
            stage(&staged, url, &response).await;
        }

        let mut media_failures = 0;
        for (url, result) in self.fetch_all(resolved.media).await {
            match result {
                Ok(response) if response.is_cacheable() => stage(&staged, url, &response).await,
                Ok(response) => {
                    warn!(%url, reason = %rejection_reason(&response), "media prefetch skipped");
                    media_failures += 1;
                }
                Err(e) => {
                    warn!(%url, error = %e, "media prefetch failed");
                    media_failures += 1;
                }
            }
        }

        Ok((staged, media_failures))
    }

    /// Fetch `urls` with bounded concurrency, results in input order.
    async fn fetch_all(&self, urls: Vec<Url>) -> Vec<(Url, Result<Response>)> {
        let fetcher = self.fetcher.as_ref();
        let timeout = self.timeout;
        stream::iter(urls)
            .map(|url| async move {
                let request = Request::new(Method::GET, url.clone());
                let result = fetch_with_timeout(fetcher, &request, timeout).await;
                (url, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

async fn stage(generation: &Generation, url: Url, response: &Response) {
    let key = Request::new(Method::GET, url).identity();
    generation
        .put(key, StoredResponse::capture(response, SystemTime::now()))
        .await;
}

fn rejection_reason(response: &Response) -> String {
    if response.status != reqwest::StatusCode::OK {
        format!("status {}", response.status.as_u16())
    } else if response.redirected {
        "redirected".to_string()
    } else {
        format!("{:?} response", response.kind).to_lowercase()
    }
}
