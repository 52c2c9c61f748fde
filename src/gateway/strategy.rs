//! The three fetch strategies over the current generation.
//!
//! | Strategy       | Network OK (200)        | Network OK (other) | Network error                 |
//! |----------------|-------------------------|--------------------|-------------------------------|
//! | `NetworkFirst` | store, return live      | cached, else live  | cached, else synthesized 404  |
//! | `Default`      | store, return live      | return live        | cached, else `Err` (escalate) |
//! | `CacheFirst`   | hit: cached + refresh in background; miss: store, return live; miss + error: `Err` |
//!
//! Only responses passing [`Response::is_cacheable`] are stored. Writes go to
//! whatever generation is current at write time and replace the entry
//! wholesale.
//!
//! # Known limitation
//!
//! Writes are last-writer-wins. A slow background refresh that completes
//! after a newer write to the same key overwrites it with older content.
//! Entries carry their capture time, so rejecting such regressions would be
//! a local change in the engine's store step, but it is not done today.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::Result;
use crate::cache::{CacheService, Generation};
use crate::network::{Fetcher, fetch_with_timeout};
use crate::telemetry;
use crate::types::{Request, Response, StoredResponse, Strategy};

/// Executes fetch strategies against the shared [`CacheService`].
///
/// Cheap to clone; background refresh tasks hold their own clone.
#[derive(Clone)]
pub struct StrategyEngine {
    service: Arc<CacheService>,
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
}

impl StrategyEngine {
    pub fn new(service: Arc<CacheService>, fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        Self {
            service,
            fetcher,
            timeout,
        }
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `strategy` for `request`.
    ///
    /// `Err` means the strategy could not produce a response: either the
    /// store is unusable ([`is_store`](crate::HoardError::is_store)) or the
    /// network failed with nothing cached
    /// ([`is_network`](crate::HoardError::is_network)).
    pub async fn execute(&self, strategy: Strategy, request: &Request) -> Result<Response> {
        match strategy {
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::Default => self.network_with_fallback(request).await,
        }
    }

    /// Serve the stored entry immediately and refresh it in the background;
    /// on a miss, fetch, store and return.
    pub async fn cache_first(&self, request: &Request) -> Result<Response> {
        let generation = self.service.current().await?;
        if let Some(entry) = self.lookup(&generation, request, Strategy::CacheFirst).await {
            self.spawn_refresh(request.clone());
            return Ok(entry.to_response());
        }

        let response = self.fetch(request).await?;
        self.store(request, &response).await;
        Ok(response)
    }

    /// Prefer the network; fall back to the stored entry; otherwise a
    /// synthesized unavailable response. Never fails on network errors.
    pub async fn network_first(&self, request: &Request) -> Result<Response> {
        let generation = self.service.current().await?;
        match self.fetch(request).await {
            Ok(response) if response.status == StatusCode::OK => {
                self.store(request, &response).await;
                Ok(response)
            }
            Ok(response) => {
                let cached = self.lookup(&generation, request, Strategy::NetworkFirst).await;
                Ok(cached.map_or(response, |entry| entry.to_response()))
            }
            Err(_) => {
                let cached = self.lookup(&generation, request, Strategy::NetworkFirst).await;
                Ok(cached.map_or_else(Response::unavailable, |entry| entry.to_response()))
            }
        }
    }

    /// Prefer the network; fall back to the stored entry; otherwise return
    /// the network error so the caller can pick an offline fallback.
    pub async fn network_with_fallback(&self, request: &Request) -> Result<Response> {
        let generation = self.service.current().await?;
        match self.fetch(request).await {
            Ok(response) => {
                self.store(request, &response).await;
                Ok(response)
            }
            Err(e) => match self.lookup(&generation, request, Strategy::Default).await {
                Some(entry) => Ok(entry.to_response()),
                None => Err(e),
            },
        }
    }

    async fn fetch(&self, request: &Request) -> Result<Response> {
        fetch_with_timeout(self.fetcher.as_ref(), request, self.timeout).await
    }

    async fn lookup(
        &self,
        generation: &Generation,
        request: &Request,
        strategy: Strategy,
    ) -> Option<Arc<StoredResponse>> {
        let entry = generation.get(&request.identity()).await;
        let name = if entry.is_some() {
            telemetry::CACHE_HITS_TOTAL
        } else {
            telemetry::CACHE_MISSES_TOTAL
        };
        metrics::counter!(name, "strategy" => strategy.as_str()).increment(1);
        debug!(url = %request.url, %strategy, hit = entry.is_some(), "cache lookup");
        entry
    }

    /// Persist `response` into the current generation if it is eligible.
    /// Returns whether an entry was written.
    async fn store(&self, request: &Request, response: &Response) -> bool {
        if !response.is_cacheable() {
            return false;
        }
        match self.service.current().await {
            Ok(generation) => {
                let entry = StoredResponse::capture(response, SystemTime::now());
                generation.put(request.identity(), entry).await;
                true
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "skipping cache write");
                false
            }
        }
    }

    /// Detached refresh of a cache-first entry. Failures are logged and
    /// dropped; the response already returned is unaffected.
    fn spawn_refresh(&self, request: Request) {
        let engine = self.clone();
        tokio::spawn(async move {
            let outcome = match engine.fetch(&request).await {
                Ok(response) => {
                    if engine.store(&request, &response).await {
                        "stored"
                    } else {
                        debug!(url = %request.url, status = %response.status, "refresh not cacheable");
                        "skipped"
                    }
                }
                Err(e) => {
                    warn!(url = %request.url, error = %e, "background refresh failed");
                    "error"
                }
            };
            metrics::counter!(telemetry::BACKGROUND_REFRESHES_TOTAL, "outcome" => outcome)
                .increment(1);
        });
    }
}

impl std::fmt::Debug for StrategyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyEngine")
            .field("fetcher", &self.fetcher.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
