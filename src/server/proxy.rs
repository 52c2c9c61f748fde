//! HTTP hosting shim: every inbound request goes through a [`CacheWorker`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::header::{CONNECTION, HeaderName, HeaderValue, TRANSFER_ENCODING};
use axum::http::{StatusCode, request::Parts};
use axum::response::{IntoResponse, Response as HttpResponse};
use reqwest::Url;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::types::{Request, Response};
use crate::{CacheWorker, HoardError, Result};

/// Response header naming where the body came from.
pub const SOURCE_HEADER: HeaderName = HeaderName::from_static("x-hoard-source");

/// Largest request body forwarded upstream.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct ProxyState {
    worker: Arc<dyn CacheWorker>,
    origin: Url,
}

impl ProxyState {
    pub fn new(worker: Arc<dyn CacheWorker>, origin: Url) -> Self {
        Self { worker, origin }
    }
}

/// Router that sends every path to the worker.
pub fn router(state: ProxyState) -> Router {
    Router::new().fallback(handle).with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: ProxyState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| HoardError::Configuration(format!("failed to bind {addr}: {e}")))?;
    info!(%addr, origin = %state.origin, "proxy listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .map_err(|e| HoardError::Configuration(format!("server error: {e}")))
}

async fn handle(State(state): State<ProxyState>, request: axum::extract::Request) -> HttpResponse {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, "rejecting request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };
    let request = match to_request(&state.origin, parts) {
        Ok(request) => request.with_body(body),
        Err(e) => {
            debug!(error = %e, "rejecting request");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let response = state.worker.intercept(&request).await;
    into_http(response)
}

/// Rebase an inbound request onto the origin.
pub fn to_request(origin: &Url, parts: Parts) -> Result<Request> {
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = origin
        .join(path)
        .map_err(|e| HoardError::InvalidInput(format!("cannot rebase {path:?}: {e}")))?;
    Ok(Request::new(parts.method, url).with_headers(parts.headers))
}

/// Convert a worker response, tagging its source.
pub fn into_http(response: Response) -> HttpResponse {
    let mut headers = response.headers;
    headers.remove(TRANSFER_ENCODING);
    headers.remove(CONNECTION);
    headers.insert(
        SOURCE_HEADER,
        HeaderValue::from_static(response.source.as_str()),
    );
    (response.status, headers, Body::from(response.body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseSource;
    use axum::http::Method;

    fn parts(method: Method, uri: &str) -> Parts {
        let (parts, _) = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("accept", "text/html")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn request_is_rebased_onto_origin() {
        let origin = Url::parse("https://game.test").unwrap();
        let request = to_request(&origin, parts(Method::GET, "/videos/red.webm?t=3")).unwrap();
        assert_eq!(request.url.as_str(), "https://game.test/videos/red.webm?t=3");
        assert_eq!(request.method, Method::GET);
        assert!(request.accepts_document());
    }

    #[test]
    fn absolute_form_keeps_origin() {
        let origin = Url::parse("https://game.test").unwrap();
        let request = to_request(&origin, parts(Method::POST, "http://elsewhere.test/api/score"))
            .unwrap();
        assert_eq!(request.url.as_str(), "https://game.test/api/score");
    }

    #[test]
    fn response_carries_source_header() {
        let response = into_http(Response::unavailable());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[&SOURCE_HEADER], "synthesized");

        let cached = Response::unavailable().with_source(ResponseSource::Cache);
        assert_eq!(into_http(cached).headers()[&SOURCE_HEADER], "cache");
    }
}
