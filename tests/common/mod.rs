//! Shared fixtures: an in-memory origin and a small deployment manifest.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use hoard::cache::Generation;
use hoard::types::{Manifest, MediaSet, Request, Response};
use hoard::{CacheWorker, EmbeddedCache, Fetcher, Hoard, HoardBuilder, HoardError, Result};

pub const ORIGIN: &str = "https://game.test";

// ============================================================================
// Mock origin
// ============================================================================

#[derive(Clone)]
struct Route {
    status: u16,
    content_type: &'static str,
    body: String,
    redirected: bool,
}

/// Origin keyed by URL path. Unknown paths answer 404.
#[derive(Default)]
pub struct MockOrigin {
    routes: Mutex<HashMap<String, Route>>,
    stalled: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: AtomicU32,
    calls_by_path: Mutex<HashMap<String, u32>>,
}

impl MockOrigin {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Origin serving the [`small_manifest`] plus the offline document.
    pub fn deployed() -> Arc<Self> {
        let origin = Self::new();
        origin.serve_html("/", "<html>home</html>");
        origin.serve_html("/index.html", "<html>index</html>");
        origin.serve_html("/offline.html", "<html>offline</html>");
        origin.serve("/assets/app.js", "console.log('v1')");
        origin.serve("/assets/app.css", "body{}");
        origin.serve("/icon/favicon.ico", "ico");
        origin.serve("/videos/red-poster.jpg", "red-poster");
        origin.serve("/videos/red.webm", "red-webm");
        origin.serve("/videos/red_optimized.mp4", "red-mp4");
        origin
    }

    pub fn serve(&self, path: &str, body: &str) {
        self.route(path, 200, "text/plain", body, false);
    }

    pub fn serve_html(&self, path: &str, body: &str) {
        self.route(path, 200, "text/html", body, false);
    }

    pub fn serve_status(&self, path: &str, status: u16, body: &str) {
        self.route(path, status, "text/plain", body, false);
    }

    pub fn serve_redirected(&self, path: &str, body: &str) {
        self.route(path, 200, "text/plain", body, true);
    }

    fn route(&self, path: &str, status: u16, content_type: &'static str, body: &str, redirected: bool) {
        self.routes.lock().unwrap().insert(
            path.to_string(),
            Route {
                status,
                content_type,
                body: body.to_string(),
                redirected,
            },
        );
    }

    /// Requests to `path` never complete.
    pub fn stall(&self, path: &str) {
        self.stalled.lock().unwrap().insert(path.to_string());
    }

    /// Simulate loss of connectivity: every fetch fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_to(&self, path: &str) -> u32 {
        self.calls_by_path
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for MockOrigin {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, request: &Request) -> Result<Response> {
        let path = request.url.path().to_string();
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls_by_path
            .lock()
            .unwrap()
            .entry(path.clone())
            .or_default() += 1;

        if self.offline.load(Ordering::SeqCst) {
            return Err(HoardError::Http("connection refused".to_string()));
        }
        if self.stalled.lock().unwrap().contains(&path) {
            std::future::pending::<()>().await;
        }

        let route = self.routes.lock().unwrap().get(&path).cloned();
        let Some(route) = route else {
            return Ok(Response::network(
                StatusCode::NOT_FOUND,
                HeaderMap::new(),
                "not found",
            ));
        };
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(route.content_type));
        let status = StatusCode::from_u16(route.status).unwrap();
        Ok(Response::network(status, headers, route.body).with_redirected(route.redirected))
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Shell: `/`, `/index.html`, two bundled assets, an icon. Media: `red`.
pub fn small_manifest() -> Manifest {
    Manifest::empty()
        .shell("/")
        .shell("/index.html")
        .shell("/assets/app.js")
        .shell("/assets/app.css")
        .shell("/icon/favicon.ico")
        .media(MediaSet::conventional("red"))
}

pub fn builder(origin: &Arc<MockOrigin>) -> HoardBuilder {
    Hoard::builder()
        .origin(ORIGIN)
        .fetcher(origin.clone())
        .manifest(small_manifest())
        .version("v1")
}

/// Install and activate a fresh cache over `origin`.
pub async fn deployed_cache(origin: &Arc<MockOrigin>) -> EmbeddedCache {
    let cache = builder(origin).build().unwrap();
    cache.on_install().await.unwrap();
    cache.on_activate().await.unwrap();
    cache
}

pub fn get(path: &str) -> Request {
    Request::get(&format!("{ORIGIN}{path}")).unwrap()
}

pub fn page(path: &str) -> Request {
    get(path).accept("text/html,application/xhtml+xml")
}

pub fn body(response: &Response) -> &str {
    std::str::from_utf8(&response.body).unwrap()
}

pub async fn current(cache: &EmbeddedCache) -> Arc<Generation> {
    cache.service().current().await.unwrap()
}

/// Wait until `cond` holds, yielding to background tasks in between.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}
