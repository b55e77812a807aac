//! Patient intake and listing endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::models::{NewPatient, Patient};
use crate::snapshot::Collection;
use crate::state::AppState;

/// `POST /api/patients` — register a patient.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewPatient>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let patient = state.store.create_patient(new)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients` — all patients, newest first.
///
/// Write-through: the live read refreshes the snapshot cache so the
/// next cold start can seed instantly. A cache failure never fails the
/// request.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Patient>>, ApiError> {
    let patients = state.store.list_patients()?;
    if let Err(e) = state.snapshot.save(Collection::Patients, &patients) {
        tracing::warn!(error = %e, "Patient snapshot refresh failed");
    }
    Ok(Json(patients))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_id(&id)?;
    state
        .store
        .get_patient(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown patient: {id}")))
}
