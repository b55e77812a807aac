//! Diagnosis history endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use crate::api::endpoints::parse_id;
use crate::api::error::ApiError;
use crate::models::Diagnosis;
use crate::snapshot::Collection;
use crate::state::AppState;

/// `GET /api/diagnoses` — all diagnoses, newest first. Refreshes the
/// snapshot cache as a side effect of the live read.
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Diagnosis>>, ApiError> {
    let diagnoses = state.store.list_diagnoses()?;
    if let Err(e) = state.snapshot.save(Collection::Diagnoses, &diagnoses) {
        tracing::warn!(error = %e, "Diagnosis snapshot refresh failed");
    }
    Ok(Json(diagnoses))
}

/// `GET /api/diagnoses/:id`
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Diagnosis>, ApiError> {
    let id = parse_id(&id)?;
    state
        .store
        .get_diagnosis(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown diagnosis: {id}")))
}

/// `GET /api/patients/:id/diagnoses` — one patient's history, newest
/// first.
pub async fn for_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Diagnosis>>, ApiError> {
    let id = parse_id(&id)?;
    if state.store.get_patient(&id)?.is_none() {
        return Err(ApiError::NotFound(format!("Unknown patient: {id}")));
    }
    Ok(Json(state.store.list_diagnoses_for_patient(&id)?))
}
