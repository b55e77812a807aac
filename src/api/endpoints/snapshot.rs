//! Snapshot seed endpoint — last-known list data for instant first
//! render while the live reads are still in flight.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::snapshot::SnapshotSeed;
use crate::state::AppState;

/// `GET /api/snapshot`
pub async fn seed(State(state): State<Arc<AppState>>) -> Result<Json<SnapshotSeed>, ApiError> {
    Ok(Json(state.snapshot.seed()?))
}
