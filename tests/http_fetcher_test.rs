//! HttpFetcher against a wiremock origin, and a full deployment over HTTP.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hoard::types::{Manifest, Request, ResponseKind, ResponseSource};
use hoard::{CacheWorker, FetchConfig, Fetcher, Hoard, HttpFetcher};

fn fetcher(origin: &str) -> HttpFetcher {
    HttpFetcher::new(Url::parse(origin).unwrap(), &FetchConfig::default()).unwrap()
}

#[tokio::test]
async fn same_origin_response_is_basic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/assets/app.js"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/javascript")
                .set_body_string("console.log('hi')"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::get(&format!("{}/assets/app.js", server.uri())).unwrap();
    let response = fetcher(&server.uri()).fetch(&request).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.kind, ResponseKind::Basic);
    assert!(!response.redirected);
    assert!(response.is_cacheable());
    assert_eq!(response.body.as_ref(), b"console.log('hi')");
    assert_eq!(response.headers["content-type"], "application/javascript");
}

#[tokio::test]
async fn error_status_is_ok_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let request = Request::get(&format!("{}/gone", server.uri())).unwrap();
    let response = fetcher(&server.uri()).fetch(&request).await.unwrap();
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(!response.is_cacheable());
}

#[tokio::test]
async fn followed_redirect_is_marked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .mount(&server)
        .await;

    let request = Request::get(&format!("{}/old", server.uri())).unwrap();
    let response = fetcher(&server.uri()).fetch(&request).await.unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.redirected);
    assert!(!response.is_cacheable());
}

#[tokio::test]
async fn cross_origin_responses_are_cors_or_opaque() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cdn/shared.js"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("access-control-allow-origin", "*"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cdn/private.js"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let other = fetcher("https://game.test");
    let shared = Request::get(&format!("{}/cdn/shared.js", server.uri())).unwrap();
    let private = Request::get(&format!("{}/cdn/private.js", server.uri())).unwrap();

    assert_eq!(other.fetch(&shared).await.unwrap().kind, ResponseKind::Cors);
    let opaque = other.fetch(&private).await.unwrap();
    assert_eq!(opaque.kind, ResponseKind::Opaque);
    assert!(!opaque.is_cacheable());
}

#[tokio::test]
async fn connection_failure_is_network_error() {
    let request = Request::get("http://127.0.0.1:1/").unwrap();
    let err = fetcher("http://127.0.0.1:1").fetch(&request).await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn slow_origin_hits_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let config = FetchConfig::new().timeout(Duration::from_millis(100));
    let http = HttpFetcher::new(Url::parse(&server.uri()).unwrap(), &config).unwrap();
    let request = Request::get(&server.uri()).unwrap();
    assert!(http.fetch(&request).await.unwrap_err().is_network());
}

/// Install over real HTTP, then serve a page load while the origin is down.
#[tokio::test]
async fn deployment_survives_origin_outage() {
    let server = MockServer::start().await;
    for (route, body) in [
        ("/", "<html>home</html>"),
        ("/assets/app.js", "app"),
        ("/offline.html", "<html>offline</html>"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }

    let cache = Hoard::builder()
        .origin(server.uri())
        .manifest(Manifest::empty().shell("/").shell("/assets/app.js"))
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let outcome = cache.on_install().await.unwrap();
    assert!(outcome.skip_waiting());
    cache.on_activate().await.unwrap();

    let page = Request::get(&format!("{}/levels/1", server.uri()))
        .unwrap()
        .accept("text/html");

    // A 404 from a live origin is a real answer, not an outage.
    server.reset().await;
    let response = cache.intercept(&page).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.source, ResponseSource::Network);

    // Origin stops answering in time.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    let response = cache.intercept(&page).await;
    assert_eq!(response.source, ResponseSource::Offline);
    assert_eq!(response.body.as_ref(), b"<html>offline</html>");

    let app = Request::get(&format!("{}/assets/app.js", server.uri())).unwrap();
    let response = cache.intercept(&app).await;
    assert_eq!(response.source, ResponseSource::Cache);
    assert_eq!(response.body.as_ref(), b"app");
}
