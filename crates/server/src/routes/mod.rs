pub mod alerts;
pub mod health;
pub mod patients;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /patients                        known patient ids
/// /patients/{id}/readings          range query (?start=&end=)
/// /alerts                          injected-alert registry snapshot
/// /alerts/{id}                     one patient's injected-alert state
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(patients::router())
        .merge(alerts::router())
}

/// `/ws`, mounted at the root next to `/health`.
pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws::ws_handler))
}
