use axum::extract::{Path, State};
use axum::{routing::get, Json, Router};
use cardio_core::alert::AlertState;
use cardio_core::types::PatientId;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /alerts -- every registered patient, ordered by id.
async fn list_alerts(State(state): State<AppState>) -> Json<Vec<AlertState>> {
    Json(state.registry.snapshot().into_values().collect())
}

/// GET /alerts/{id}
async fn get_alert(
    State(state): State<AppState>,
    Path(patient_id): Path<PatientId>,
) -> AppResult<Json<AlertState>> {
    Ok(Json(state.registry.get(patient_id)?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/alerts", get(list_alerts))
        .route("/alerts/{id}", get(get_alert))
}
