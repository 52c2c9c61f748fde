//! Intercepted requests and their cache identity.

use std::fmt;

use bytes::Bytes;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, Url};

use crate::{HoardError, Result};

/// Cache key for a request: method plus absolute URL (fragment stripped).
///
/// Two requests with the same method and URL address the same entry
/// regardless of body or non-identity headers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity {
    method: Method,
    url: String,
}

impl RequestIdentity {
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method,
            url: url.into(),
        }
    }

    /// Identity of a plain `GET` for `url`.
    pub fn get(url: &Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// An outbound request as seen by the interceptor.
///
/// The body only matters for requests that bypass the cache; it never
/// contributes to the cache identity.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Parse `url` and build a `GET` request for it.
    pub fn get(url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| HoardError::InvalidInput(format!("invalid URL {url:?}: {e}")))?;
        Ok(Self::new(Method::GET, url))
    }

    /// Replace the header map.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attach a request body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the `Accept` header.
    pub fn accept(mut self, value: &'static str) -> Self {
        self.headers.insert(ACCEPT, HeaderValue::from_static(value));
        self
    }

    /// Cache key for this request.
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity::new(self.method.clone(), &self.url)
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Whether the caller declared it accepts an interactive document.
    pub fn accepts_document(&self) -> bool {
        self.headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.contains("text/html"))
    }
}
