use axum::extract::{Path, Query, State};
use axum::{routing::get, Json, Router};
use cardio_core::reading::Reading;
use cardio_core::types::{PatientId, TimestampMs};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start: Option<TimestampMs>,
    pub end: Option<TimestampMs>,
}

/// GET /patients
async fn list_patients(State(state): State<AppState>) -> Json<Vec<PatientId>> {
    Json(state.store.list_patients().into_iter().collect())
}

/// GET /patients/{id}/readings
///
/// Inclusive on both ends; an unknown patient yields an empty list.
async fn readings(
    State(state): State<AppState>,
    Path(patient_id): Path<PatientId>,
    Query(range): Query<RangeParams>,
) -> AppResult<Json<Vec<Reading>>> {
    let start = range.start.unwrap_or(0);
    let end = range.end.unwrap_or(TimestampMs::MAX);
    if start > end {
        return Err(AppError::BadRequest(format!(
            "start ({start}) must not be after end ({end})"
        )));
    }
    Ok(Json(state.store.query(patient_id, start, end)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list_patients))
        .route("/patients/{id}/readings", get(readings))
}
