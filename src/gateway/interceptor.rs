//! Per-request orchestration: classify, dispatch, fall back.

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Method, Url};
use tracing::{debug, instrument, warn};

use super::routing::PolicyClassifier;
use super::strategy::StrategyEngine;
use crate::cache::CacheService;
use crate::network::fetch_with_timeout;
use crate::telemetry;
use crate::types::{Classification, Request, Response, ResponseSource};

/// Entry point for every request the host hands over.
///
/// [`intercept`](Self::intercept) is total: every path ends in a fresh or
/// stored response, the offline document, or a synthesized error response.
#[derive(Debug)]
pub struct RequestInterceptor {
    classifier: PolicyClassifier,
    engine: StrategyEngine,
    service: Arc<CacheService>,
    offline_url: Url,
}

impl RequestInterceptor {
    pub fn new(
        classifier: PolicyClassifier,
        engine: StrategyEngine,
        service: Arc<CacheService>,
        offline_url: Url,
    ) -> Self {
        Self {
            classifier,
            engine,
            service,
            offline_url,
        }
    }

    pub fn classifier(&self) -> &PolicyClassifier {
        &self.classifier
    }

    pub fn engine(&self) -> &StrategyEngine {
        &self.engine
    }

    /// Absolute URL of the offline document.
    pub fn offline_url(&self) -> &Url {
        &self.offline_url
    }

    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn intercept(&self, request: &Request) -> Response {
        let start = Instant::now();
        let classification = self.classifier.classify_request(request);

        let response = match classification {
            Classification::Bypass => self.pass_through(request).await,
            Classification::Cached(strategy) => {
                match self.engine.execute(strategy, request).await {
                    Ok(response) => response,
                    Err(e) if e.is_store() => {
                        warn!(error = %e, "cache store unavailable");
                        Response::store_unavailable()
                    }
                    Err(e) => {
                        debug!(error = %e, "strategy exhausted, using offline fallback");
                        self.offline_fallback(request).await
                    }
                }
            }
        };

        metrics::counter!(
            telemetry::REQUESTS_TOTAL,
            "strategy" => classification.label(),
            "outcome" => response.source.as_str()
        )
        .increment(1);
        metrics::histogram!(
            telemetry::REQUEST_DURATION_SECONDS,
            "strategy" => classification.label()
        )
        .record(start.elapsed().as_secs_f64());

        response
    }

    /// Forward a non-cacheable request without touching the store.
    async fn pass_through(&self, request: &Request) -> Response {
        match fetch_with_timeout(self.engine.fetcher().as_ref(), request, self.engine.timeout())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "pass-through failed");
                Response::bad_gateway()
            }
        }
    }

    /// Document requests get the stored offline page; everything else gets
    /// an explicit unavailable response.
    async fn offline_fallback(&self, request: &Request) -> Response {
        if !request.accepts_document() {
            return Response::unavailable();
        }
        let key = Request::new(Method::GET, self.offline_url.clone()).identity();
        match self.service.current().await {
            Ok(generation) => match generation.get(&key).await {
                Some(entry) => entry.to_response().with_source(ResponseSource::Offline),
                None => {
                    warn!(offline = %self.offline_url, "offline document not cached");
                    Response::unavailable()
                }
            },
            Err(e) => {
                warn!(error = %e, "cannot open store for offline document");
                Response::unavailable()
            }
        }
    }
}
