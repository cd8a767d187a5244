//! Patient vitals simulation server.
//!
//! Exposes config, state, error handling, routes and the listener tasks so
//! integration tests and the binary entrypoint can both use them.

pub mod config;
pub mod error;
pub mod ingest;
pub mod routes;
pub mod state;
pub mod tcp_output;
pub mod ws;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use cardio_pipeline::{AlertEvaluator, GeneratorSet, Scheduler};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::state::AppState;

/// How long shutdown waits for each listener task.
const LISTENER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Full application router with its middleware stack.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::ws_routes())
        .nest("/api/v1", routes::api_routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Bind every listener, start the simulation and serve until `shutdown`
/// resolves.
///
/// Any bind failure aborts before the simulation starts.
pub async fn run<F>(config: ServerConfig, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    serve(AppState::from_config(config), shutdown).await
}

/// [`run`] over caller-supplied state, configured by `state.config`.
pub async fn serve<F>(state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let http_listener = bind(state.config.http_addr()).await?;
    let ingest_listener = match state.config.tcp_ingest_addr() {
        Some(addr) => Some(bind(addr).await?),
        None => None,
    };
    let output_listener = match state.config.tcp_output_addr() {
        Some(addr) => Some(bind(addr).await?),
        None => None,
    };

    let config = Arc::clone(&state.config);
    let cancel = CancellationToken::new();

    // --- Listeners ---
    let mut listener_tasks = Vec::new();
    if let Some(listener) = ingest_listener {
        tracing::info!(addr = ?listener.local_addr().ok(), "TCP ingest listening");
        listener_tasks.push(tokio::spawn(ingest::serve_tcp_ingest(
            listener,
            Arc::clone(&state.store),
            cancel.clone(),
        )));
    }
    if let Some(listener) = output_listener {
        tracing::info!(addr = ?listener.local_addr().ok(), "TCP output listening");
        listener_tasks.push(tokio::spawn(tcp_output::serve_tcp_output(
            listener,
            Arc::clone(&state.hub),
            cancel.clone(),
        )));
    }

    // --- Simulation ---
    let patients = config.patient_ids();
    let generators = match config.simulation_seed {
        Some(seed) => GeneratorSet::seeded(seed, &patients),
        None => GeneratorSet::from_entropy(&patients),
    };
    let evaluator = Arc::new(AlertEvaluator::new(
        Arc::clone(&state.store),
        Arc::clone(&state.registry),
        config.evaluator_config(),
    ));
    let scheduler = Scheduler::new(
        Arc::clone(&state.store),
        Arc::clone(&state.registry),
        Arc::clone(&state.hub),
        evaluator,
        generators,
        config.scheduler_config(),
    )
    .start(&patients);

    // --- HTTP ---
    let hub = Arc::clone(&state.hub);
    let app = build_router(state);
    tracing::info!(addr = %config.http_addr(), "Starting server");

    axum::serve(http_listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    scheduler.shutdown().await;

    cancel.cancel();
    for task in listener_tasks {
        let _ = tokio::time::timeout(LISTENER_SHUTDOWN_TIMEOUT, task).await;
    }

    hub.shutdown_all().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}
