// tests/serve_http.rs

use std::fs;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use tower::ServiceExt; // for `oneshot` (tower 0.5 with features=["util"])
use trade_brief::api;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_and_static_site() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("briefs")).unwrap();
    fs::write(tmp.path().join("index.html"), "<h1>dashboard</h1>").unwrap();
    fs::write(tmp.path().join("briefs/2026-01-02.html"), "<p>day</p>").unwrap();

    let app = api::router(tmp.path(), None);

    let resp = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");

    let resp = app.clone().oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>dashboard</h1>");

    let resp = app.clone().oneshot(get("/briefs/2026-01-02.html")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(get("/briefs/1999-01-01.html")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_route_absent_without_recorder() {
    let tmp = tempfile::tempdir().unwrap();
    let app = api::router(tmp.path(), None);
    let resp = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
