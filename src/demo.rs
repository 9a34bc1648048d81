//! Long-running request demo service.
//!
//! Two routes, no state:
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | `GET` | `/` | `{"message": "FastAPI is running"}` |
//! | `GET` | `/long-process` | after the configured delay (70 s): `{"status": "done", "duration_seconds": 70}` |
//!
//! The delay is a `tokio::time::sleep`, so the handler yields to the runtime
//! and every other request keeps being served while it waits. A client that
//! disconnects mid-wait simply drops the handler future.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::time::Duration;

use crate::config::DemoConfig;

#[derive(Clone)]
struct DemoState {
    delay: Duration,
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct LongProcessResponse {
    status: &'static str,
    duration_seconds: u64,
}

pub fn router(delay: Duration) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/long-process", get(handle_long_process))
        .with_state(DemoState { delay })
}

/// Serve the demo on `[demo].bind` until Ctrl-C.
pub async fn run_demo(config: &DemoConfig) -> anyhow::Result<()> {
    let app = router(Duration::from_secs(config.delay_secs));

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(bind = %config.bind, delay_secs = config.delay_secs, "demo service listening");
    println!("Demo service listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(crate::server::shutdown_signal())
        .await?;
    Ok(())
}

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "FastAPI is running",
    })
}

async fn handle_long_process(State(state): State<DemoState>) -> Json<LongProcessResponse> {
    tracing::info!(delay = ?state.delay, "long process started");
    tokio::time::sleep(state.delay).await;
    tracing::info!("long process finished");

    Json(LongProcessResponse {
        status: "done",
        duration_seconds: state.delay.as_secs(),
    })
}
