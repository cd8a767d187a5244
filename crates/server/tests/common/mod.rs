#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use cardio_server::config::ServerConfig;
use cardio_server::state::AppState;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Three patients, no notifiers, loopback host.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".parse().expect("valid loopback address"),
        port: 0,
        tcp_ingest_port: 0,
        tcp_output_port: 0,
        patient_count: 3,
        notify_channels: Vec::new(),
        ..ServerConfig::default()
    }
}

pub fn test_state() -> AppState {
    AppState::from_config(test_config())
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request"),
    )
    .await
    .expect("router is infallible")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Serve the router on an ephemeral loopback port.
pub async fn spawn_app(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let app = cardio_server::build_router(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Poll `check` until it holds or roughly two seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    check()
}
