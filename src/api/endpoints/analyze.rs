//! The symptom-analysis endpoint — the front door of the resolver.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::backend::AnalysisRequest;
use crate::models::enums::Provenance;
use crate::models::{DifferentialDiagnosis, KnowledgeSnippet, TreatmentProtocol};
use crate::resolver::ResolvedDiagnosis;
use crate::state::AppState;

/// Normalized analysis result as served to the UI. `diagnosisId` and
/// `createdAt` are absent on the degraded path, where nothing was
/// persisted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<Uuid>,
    pub primary_diagnosis: String,
    pub differential_diagnoses: Vec<DifferentialDiagnosis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment_protocol: Option<TreatmentProtocol>,
    pub requires_referral: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_reason: Option<String>,
    pub provenance: Provenance,
    pub knowledge_snippets: Vec<KnowledgeSnippet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<ResolvedDiagnosis> for AnalyzeResponse {
    fn from(resolved: ResolvedDiagnosis) -> Self {
        let (diagnosis_id, patient_id, created_at) = match &resolved.record {
            Some(record) => (Some(record.id), Some(record.patient_id), Some(record.created_at)),
            None => (None, None, None),
        };

        Self {
            diagnosis_id,
            patient_id,
            primary_diagnosis: resolved.result.primary_diagnosis,
            differential_diagnoses: resolved.result.differential_diagnoses,
            treatment_protocol: resolved.result.treatment_protocol,
            requires_referral: resolved.result.requires_referral,
            referral_reason: resolved.result.referral_reason,
            provenance: resolved.provenance,
            knowledge_snippets: resolved.knowledge_snippets,
            created_at,
        }
    }
}

/// `POST /api/analyze` — run one symptom analysis.
///
/// Validation failures are the only 400s here; backend unavailability
/// degrades to a sentinel 200 so the UI never hard-fails.
pub async fn run(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let resolved = state.resolver.analyze(request).await?;
    Ok(Json(AnalyzeResponse::from(resolved)))
}
