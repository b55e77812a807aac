//! Knowledge accumulator — turns every completed diagnosis into an
//! anonymized training-signal record.
//!
//! Derivation is pure; the append is best-effort. The diagnosis is
//! already committed when this runs, so a knowledge-base failure is
//! logged and swallowed rather than surfaced to the caller.

use crate::backend::AnalysisRequest;
use crate::models::enums::AgeGroup;
use crate::models::{Diagnosis, NewKnowledgeEntry};
use crate::records::RecordStore;

/// Confidence recorded when a diagnosis carries no differentials.
const DEFAULT_CONFIDENCE: u8 = 100;

/// Derive the anonymized entry for a completed diagnosis. No patient id
/// or name crosses this boundary; age is reduced to its bucket.
pub fn derive_entry(request: &AnalysisRequest, diagnosis: &Diagnosis) -> NewKnowledgeEntry {
    let confidence = diagnosis
        .differential_diagnoses
        .first()
        .map(|d| d.confidence)
        .unwrap_or(DEFAULT_CONFIDENCE);

    NewKnowledgeEntry {
        symptoms: diagnosis.symptoms.clone(),
        age_group: AgeGroup::from_age(request.patient_age),
        gender: request.patient_gender,
        diagnosis: diagnosis.primary_diagnosis.clone(),
        confidence: confidence.min(100),
    }
}

/// Append the derived entry, best-effort.
pub fn accumulate(store: &RecordStore, request: &AnalysisRequest, diagnosis: &Diagnosis) {
    match store.add_knowledge_entry(derive_entry(request, diagnosis)) {
        Ok(entry) => {
            tracing::debug!(entry_id = %entry.id, "Knowledge entry recorded");
        }
        Err(e) => {
            tracing::warn!(
                diagnosis_id = %diagnosis.id,
                error = %e,
                "Knowledge entry failed; diagnosis is already committed"
            );
        }
    }
}
