//! Demo service: exact root payload and non-blocking long-process handler.

mod common;

use serde_json::{json, Value};
use std::time::{Duration, Instant};

use common::spawn_app;
use docqa::demo;

#[tokio::test]
async fn root_returns_liveness_message() {
    let base = spawn_app(demo::router(Duration::from_secs(70))).await;

    let resp = reqwest::get(format!("{}/", base)).await.unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "FastAPI is running" }));
}

#[tokio::test]
async fn root_is_served_while_long_process_waits() {
    let delay = Duration::from_secs(2);
    let base = spawn_app(demo::router(delay)).await;
    let client = reqwest::Client::new();

    let long = tokio::spawn({
        let client = client.clone();
        let url = format!("{}/long-process", base);
        async move {
            let started = Instant::now();
            let resp = client.get(url).send().await.unwrap();
            let status = resp.status();
            let body: Value = resp.json().await.unwrap();
            (started.elapsed(), status, body)
        }
    });

    // Let the long request reach its sleep.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    let body: Value = client
        .get(format!("{}/", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(body["message"], "FastAPI is running");
    assert!(!long.is_finished());

    let (elapsed, status, body) = long.await.unwrap();
    assert!(status.is_success());
    assert!(elapsed >= delay);
    assert_eq!(body, json!({ "status": "done", "duration_seconds": 2 }));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let base = spawn_app(demo::router(Duration::from_secs(1))).await;
    let resp = reqwest::get(format!("{}/nope", base)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}
