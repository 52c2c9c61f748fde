//! reqwest-backed [`Fetcher`] for a single origin.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, HOST};
use reqwest::{Client, Url, redirect};

use super::traits::Fetcher;
use crate::types::{Request, Response, ResponseKind};
use crate::{HoardError, Result};

/// Configuration for [`HttpFetcher`].
///
/// ```rust
/// # use hoard::network::FetchConfig;
/// # use std::time::Duration;
/// let config = FetchConfig::new()
///     .timeout(Duration::from_secs(5))
///     .user_agent("loza-games-shell/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string. Default: `hoard/{version}`.
    pub user_agent: String,
    /// Upper bound for a single fetch, including the body. Default: 20s.
    pub timeout: Duration,
    /// Maximum redirects followed before giving up. Default: 5.
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("hoard/{}", crate::PKG_VERSION),
            timeout: Duration::from_secs(20),
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_redirects(mut self, n: usize) -> Self {
        self.max_redirects = n;
        self
    }
}

/// HTTP client for the application origin.
///
/// Responses are classified relative to `origin`: a same-origin final URL is
/// [`ResponseKind::Basic`]; a cross-origin answer is `Cors` when it carries
/// `Access-Control-Allow-Origin` and `Opaque` otherwise. A final URL that
/// differs from the requested one marks the response as redirected.
#[derive(Clone)]
pub struct HttpFetcher {
    http: Client,
    origin: Url,
}

impl HttpFetcher {
    pub fn new(origin: Url, config: &FetchConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| HoardError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, origin })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn kind_for(&self, final_url: &Url, response: &reqwest::Response) -> ResponseKind {
        if final_url.origin() == self.origin.origin() {
            ResponseKind::Basic
        } else if response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN) {
            ResponseKind::Cors
        } else {
            ResponseKind::Opaque
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, request: &Request) -> Result<Response> {
        let mut headers = request.headers.clone();
        headers.remove(HOST);

        let response = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await?;

        let final_url = response.url().clone();
        let kind = self.kind_for(&final_url, &response);
        let redirected = final_url != request.url;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response::network(status, headers, body)
            .with_kind(kind)
            .with_redirected(redirected))
    }
}
