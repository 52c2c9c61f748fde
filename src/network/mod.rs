//! Network access to the origin.
//!
//! - [`Fetcher`]: the capability strategies use to reach the network.
//! - [`HttpFetcher`]: reqwest implementation for a single origin.
//! - [`fetch_with_timeout`]: the only way the rest of the crate calls a
//!   fetcher: bounds the call and records the outcome.

mod http;
mod traits;

pub use http::{FetchConfig, HttpFetcher};
pub use traits::Fetcher;

use std::time::Duration;

use tracing::debug;

use crate::telemetry;
use crate::types::{Request, Response};
use crate::{HoardError, Result};

/// Fetch `request`, treating a call that outlives `timeout` as a network failure.
pub async fn fetch_with_timeout(
    fetcher: &dyn Fetcher,
    request: &Request,
    timeout: Duration,
) -> Result<Response> {
    let result = match tokio::time::timeout(timeout, fetcher.fetch(request)).await {
        Ok(result) => result,
        Err(_) => Err(HoardError::Timeout(timeout)),
    };

    let outcome = match &result {
        Ok(_) => "ok",
        Err(HoardError::Timeout(_)) => "timeout",
        Err(_) => "error",
    };
    metrics::counter!(telemetry::NETWORK_FETCHES_TOTAL, "outcome" => outcome).increment(1);

    if let Err(e) = &result {
        debug!(fetcher = fetcher.name(), url = %request.url, error = %e, "network fetch failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;

    use super::*;

    struct Stalled;

    #[async_trait]
    impl Fetcher for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn fetch(&self, _request: &Request) -> Result<Response> {
            std::future::pending().await
        }
    }

    struct Immediate;

    #[async_trait]
    impl Fetcher for Immediate {
        fn name(&self) -> &str {
            "immediate"
        }

        async fn fetch(&self, _request: &Request) -> Result<Response> {
            Ok(Response::network(StatusCode::OK, HeaderMap::new(), "ok"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_fetch_times_out() {
        let request = Request::get("https://game.test/videos/red.webm").unwrap();
        let err = fetch_with_timeout(&Stalled, &request, Duration::from_secs(20))
            .await
            .unwrap_err();
        assert!(matches!(err, HoardError::Timeout(_)));
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn fast_fetch_passes_through() {
        let request = Request::get("https://game.test/").unwrap();
        let response = fetch_with_timeout(&Immediate, &request, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }
}
