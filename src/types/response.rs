//! Live and stored responses.

use std::time::{Duration, SystemTime};

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, DATE, HeaderMap, HeaderValue};
use serde::Serialize;

/// Origin relationship of a response, mirroring fetch response types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    /// Same-origin response with readable status and body.
    Basic,
    /// Cross-origin response with CORS approval.
    Cors,
    /// Cross-origin response without CORS; status and body are not trustworthy.
    Opaque,
}

/// Where a response handed back to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// The designated offline document.
    Offline,
    /// Built locally to signal unavailability.
    Synthesized,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Offline => "offline",
            ResponseSource::Synthesized => "synthesized",
        }
    }
}

/// A response as returned to the caller.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub kind: ResponseKind,
    /// Whether the origin answered through at least one redirect.
    pub redirected: bool,
    pub source: ResponseSource,
}

impl Response {
    /// A direct same-origin response from the network.
    pub fn network(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            kind: ResponseKind::Basic,
            redirected: false,
            source: ResponseSource::Network,
        }
    }

    /// A locally built response carrying a short plain-text body.
    pub fn synthesized(status: StatusCode, body: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        Self {
            status,
            headers,
            body: Bytes::from_static(body.as_bytes()),
            kind: ResponseKind::Basic,
            redirected: false,
            source: ResponseSource::Synthesized,
        }
    }

    /// Neither network nor cache could serve the request.
    pub fn unavailable() -> Self {
        Self::synthesized(StatusCode::NOT_FOUND, "Not available")
    }

    /// The current cache generation could not be opened.
    pub fn store_unavailable() -> Self {
        Self::synthesized(StatusCode::SERVICE_UNAVAILABLE, "Cache unavailable")
    }

    /// A pass-through request failed at the network layer.
    pub fn bad_gateway() -> Self {
        Self::synthesized(StatusCode::BAD_GATEWAY, "Origin unreachable")
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_redirected(mut self, redirected: bool) -> Self {
        self.redirected = redirected;
        self
    }

    pub fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self
    }

    /// Eligibility gate for persisting into the store: a direct,
    /// non-redirected, same-origin `200`.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK && self.kind == ResponseKind::Basic && !self.redirected
    }
}

/// Immutable snapshot of a response accepted into a generation.
///
/// Header names are case-insensitive and unique; refresh replaces the
/// whole entry rather than mutating it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub captured_at: SystemTime,
}

impl StoredResponse {
    /// Snapshot `response` as captured at `at`.
    ///
    /// Each header name appears once and keeps every value the origin sent
    /// for it, in order (`set-cookie`, `vary`).
    pub fn capture(response: &Response, at: SystemTime) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            captured_at: at,
        }
    }

    /// Rebuild a caller-facing response from this snapshot.
    pub fn to_response(&self) -> Response {
        Response {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            kind: ResponseKind::Basic,
            redirected: false,
            source: ResponseSource::Cache,
        }
    }

    /// Age relative to `now`; zero if the capture lies in the future.
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.captured_at).unwrap_or(Duration::ZERO)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header_str(CONTENT_TYPE.as_str())
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header_str(CONTENT_LENGTH.as_str())
            .and_then(|v| v.trim().parse().ok())
    }

    /// The origin's `Date` header, verbatim.
    pub fn date(&self) -> Option<&str> {
        self.header_str(DATE.as_str())
    }

    fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
