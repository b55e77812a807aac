//! Diagnosis resolver — per-request backend selection with graceful
//! degradation.
//!
//! Routing contract:
//! - offline → fallback directly, primary untouched
//! - online → primary once; any failure retries via the fallback, never
//!   the same backend
//! - both down → a sentinel result returned as success, so the caller
//!   never hard-fails on connectivity
//!
//! Only a malformed request (empty symptoms, missing patient id) is a
//! hard error, raised before any network activity.

use std::sync::Arc;

use thiserror::Error;

use crate::backend::{AnalysisRequest, BackendDiagnosis, DiagnosisBackend};
use crate::connectivity::ConnectivityMonitor;
use crate::knowledge;
use crate::models::enums::Provenance;
use crate::models::{Diagnosis, KnowledgeSnippet, NewDiagnosis};
use crate::records::{RecordError, RecordStore};
use crate::validation::{self, FieldError};

/// Sentinel primary diagnosis for the degraded path.
pub const SERVICE_UNAVAILABLE_DIAGNOSIS: &str = "Diagnosis service unavailable";

/// Fixed explanation attached to the degraded sentinel result.
pub const SERVICE_UNAVAILABLE_NOTE: &str =
    "No diagnosis backend could be reached. Retry when connectivity returns, \
     and consult a clinician directly if symptoms are severe.";

/// Errors from `analyze`.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Outcome of one analysis: the normalized result, where it came from,
/// the persisted record (absent on the degraded path), and any fallback
/// knowledge snippets for supplementary display.
#[derive(Debug)]
pub struct ResolvedDiagnosis {
    pub result: BackendDiagnosis,
    pub provenance: Provenance,
    pub record: Option<Diagnosis>,
    pub knowledge_snippets: Vec<KnowledgeSnippet>,
}

pub struct DiagnosisResolver<P, F> {
    primary: P,
    fallback: F,
    connectivity: Arc<ConnectivityMonitor>,
    store: Arc<RecordStore>,
}

impl<P: DiagnosisBackend, F: DiagnosisBackend> DiagnosisResolver<P, F> {
    pub fn new(
        primary: P,
        fallback: F,
        connectivity: Arc<ConnectivityMonitor>,
        store: Arc<RecordStore>,
    ) -> Self {
        Self {
            primary,
            fallback,
            connectivity,
            store,
        }
    }

    /// Run one symptom analysis end to end: route, normalize, persist,
    /// accumulate.
    pub async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> Result<ResolvedDiagnosis, AnalysisError> {
        let errors = validation::validate_analysis_request(&request);
        if !errors.is_empty() {
            return Err(AnalysisError::Validation(errors));
        }
        let patient_id = request.patient_id.ok_or_else(|| {
            AnalysisError::Validation(vec![FieldError::new("patientId", "Patient id is required")])
        })?;

        let (outcome, provenance) = if !self.connectivity.is_online() {
            tracing::debug!("Offline; routing straight to the fallback backend");
            (self.fallback.analyze(&request).await, Provenance::Offline)
        } else {
            match self.primary.analyze(&request).await {
                Ok(result) => {
                    self.connectivity.set_online(true);
                    (Ok(result), Provenance::Online)
                }
                Err(e) => {
                    if e.is_transport() {
                        self.connectivity.set_online(false);
                    }
                    tracing::warn!(error = %e, "Primary backend failed; retrying via fallback");
                    (self.fallback.analyze(&request).await, Provenance::Offline)
                }
            }
        };

        let mut result = match outcome {
            Ok(result) => normalize(result),
            Err(e) => {
                tracing::error!(error = %e, "Fallback backend failed; returning degraded result");
                return Ok(ResolvedDiagnosis {
                    result: degraded_result(),
                    provenance: Provenance::Offline,
                    record: None,
                    knowledge_snippets: Vec::new(),
                });
            }
        };

        // Snippets ride along for display; they are not part of the
        // persisted diagnosis.
        let snippets = std::mem::take(&mut result.knowledge_snippets);

        let record = self.store.create_diagnosis(NewDiagnosis {
            patient_id,
            symptoms: request.symptoms.clone(),
            vital_signs: request.vital_signs.clone(),
            primary_diagnosis: result.primary_diagnosis.clone(),
            differential_diagnoses: result.differential_diagnoses.clone(),
            treatment_protocol: result
                .treatment_protocol
                .clone()
                .filter(|t| !t.is_empty()),
            requires_referral: result.requires_referral,
            referral_reason: result.referral_reason.clone(),
            language: request.language,
        })?;

        knowledge::accumulate(&self.store, &request, &record);

        Ok(ResolvedDiagnosis {
            result,
            provenance,
            record: Some(record),
            knowledge_snippets: snippets,
        })
    }
}

/// Clamp confidences into [0, 100]; ordering is left as the backend
/// produced it.
fn normalize(mut result: BackendDiagnosis) -> BackendDiagnosis {
    for differential in &mut result.differential_diagnoses {
        differential.confidence = differential.confidence.min(100);
    }
    result
}

fn degraded_result() -> BackendDiagnosis {
    BackendDiagnosis {
        primary_diagnosis: SERVICE_UNAVAILABLE_DIAGNOSIS.to_string(),
        differential_diagnoses: Vec::new(),
        treatment_protocol: None,
        requires_referral: false,
        referral_reason: Some(SERVICE_UNAVAILABLE_NOTE.to_string()),
        knowledge_snippets: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, MockBackend};
    use crate::models::enums::{AgeGroup, Gender, Language};
    use crate::models::{DifferentialDiagnosis, NewPatient};
    use uuid::Uuid;

    struct Harness {
        resolver: DiagnosisResolver<Arc<MockBackend>, Arc<MockBackend>>,
        primary: Arc<MockBackend>,
        fallback: Arc<MockBackend>,
        connectivity: Arc<ConnectivityMonitor>,
        store: Arc<RecordStore>,
        patient_id: Uuid,
    }

    fn online_diagnosis() -> BackendDiagnosis {
        BackendDiagnosis {
            primary_diagnosis: "Dengue fever (suspected)".into(),
            differential_diagnoses: vec![DifferentialDiagnosis {
                condition: "Dengue".into(),
                confidence: 80,
                reasoning: Some("Endemic season, fever with body ache.".into()),
            }],
            ..Default::default()
        }
    }

    fn fallback_diagnosis() -> BackendDiagnosis {
        BackendDiagnosis {
            primary_diagnosis: "Acute febrile illness (likely viral)".into(),
            differential_diagnoses: vec![DifferentialDiagnosis {
                condition: "Viral infection".into(),
                confidence: 70,
                reasoning: None,
            }],
            knowledge_snippets: vec![crate::models::KnowledgeSnippet {
                id: "kb-001".into(),
                title: "Fever in primary care".into(),
                content: "Most short fevers are viral.".into(),
                source: None,
                score: Some(2.0),
            }],
            ..Default::default()
        }
    }

    fn harness(primary: MockBackend, fallback: MockBackend) -> Harness {
        let store = Arc::new(RecordStore::in_memory().unwrap());
        let patient = store
            .create_patient(NewPatient {
                name: "Asha".into(),
                age: 30,
                gender: Gender::Female,
                weight: None,
                contact: None,
                address: None,
            })
            .unwrap();

        let primary = Arc::new(primary);
        let fallback = Arc::new(fallback);
        let connectivity = Arc::new(ConnectivityMonitor::new());

        Harness {
            resolver: DiagnosisResolver::new(
                Arc::clone(&primary),
                Arc::clone(&fallback),
                Arc::clone(&connectivity),
                Arc::clone(&store),
            ),
            primary,
            fallback,
            connectivity,
            store,
            patient_id: patient.id,
        }
    }

    fn request_for(h: &Harness, symptoms: &[&str]) -> AnalysisRequest {
        AnalysisRequest {
            patient_id: Some(h.patient_id),
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            vital_signs: None,
            patient_age: 30,
            patient_gender: Gender::Female,
            patient_weight: None,
            language: Language::En,
        }
    }

    #[tokio::test]
    async fn empty_symptoms_fail_before_any_backend_call() {
        let h = harness(
            MockBackend::responding(online_diagnosis()),
            MockBackend::responding(fallback_diagnosis()),
        );

        let err = h.resolver.analyze(request_for(&h, &[])).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
        assert_eq!(h.primary.calls(), 0);
        assert_eq!(h.fallback.calls(), 0);
    }

    #[tokio::test]
    async fn online_path_uses_primary_and_persists() {
        let h = harness(
            MockBackend::responding(online_diagnosis()),
            MockBackend::responding(fallback_diagnosis()),
        );

        let resolved = h.resolver.analyze(request_for(&h, &["fever"])).await.unwrap();

        assert_eq!(h.primary.calls(), 1);
        assert_eq!(h.fallback.calls(), 0);
        assert_eq!(resolved.provenance, Provenance::Online);
        assert_eq!(resolved.result.primary_diagnosis, "Dengue fever (suspected)");

        let record = resolved.record.expect("persisted");
        let stored = h.store.get_diagnosis(&record.id).unwrap().unwrap();
        assert_eq!(stored.primary_diagnosis, "Dengue fever (suspected)");
        assert_eq!(stored.patient_id, h.patient_id);
    }

    #[tokio::test]
    async fn offline_mode_never_touches_primary() {
        let h = harness(
            MockBackend::responding(online_diagnosis()),
            MockBackend::responding(fallback_diagnosis()),
        );
        h.connectivity.set_online(false);

        let resolved = h.resolver.analyze(request_for(&h, &["fever"])).await.unwrap();

        assert_eq!(h.primary.calls(), 0);
        assert_eq!(h.fallback.calls(), 1);
        assert_eq!(resolved.provenance, Provenance::Offline);
        assert!(resolved.record.is_some());
    }

    #[tokio::test]
    async fn primary_http_failure_falls_back_exactly_once() {
        let h = harness(
            MockBackend::failing(BackendError::Http {
                status: 500,
                body: "internal".into(),
            }),
            MockBackend::responding(fallback_diagnosis()),
        );

        let resolved = h.resolver.analyze(request_for(&h, &["fever"])).await.unwrap();

        assert_eq!(h.primary.calls(), 1);
        assert_eq!(h.fallback.calls(), 1);
        assert_eq!(resolved.provenance, Provenance::Offline);
        assert_eq!(
            resolved.result.primary_diagnosis,
            "Acute febrile illness (likely viral)",
        );
        // A 500 is the backend misbehaving, not the network being down
        assert!(h.connectivity.is_online());
    }

    #[tokio::test]
    async fn primary_transport_failure_flips_connectivity_offline() {
        let h = harness(
            MockBackend::failing(BackendError::Connection("http://remote".into())),
            MockBackend::responding(fallback_diagnosis()),
        );

        h.resolver.analyze(request_for(&h, &["fever"])).await.unwrap();
        assert!(!h.connectivity.is_online());

        // Next request routes straight to the fallback
        h.resolver.analyze(request_for(&h, &["cough"])).await.unwrap();
        assert_eq!(h.primary.calls(), 1);
        assert_eq!(h.fallback.calls(), 2);
    }

    #[tokio::test]
    async fn both_backends_down_degrades_to_sentinel() {
        let h = harness(
            MockBackend::failing(BackendError::Connection("http://remote".into())),
            MockBackend::failing(BackendError::Connection("http://localhost:8000".into())),
        );

        let resolved = h.resolver.analyze(request_for(&h, &["fever"])).await.unwrap();

        assert_eq!(resolved.result.primary_diagnosis, SERVICE_UNAVAILABLE_DIAGNOSIS);
        assert!(resolved.result.differential_diagnoses.is_empty());
        assert!(!resolved.result.requires_referral);
        assert_eq!(
            resolved.result.referral_reason.as_deref(),
            Some(SERVICE_UNAVAILABLE_NOTE),
        );
        assert_eq!(resolved.provenance, Provenance::Offline);
        assert!(resolved.record.is_none(), "sentinel is not persisted");
        assert!(h.store.list_diagnoses().unwrap().is_empty());
    }

    #[tokio::test]
    async fn successful_analysis_accumulates_one_knowledge_entry() {
        let h = harness(
            MockBackend::responding(online_diagnosis()),
            MockBackend::responding(fallback_diagnosis()),
        );

        h.resolver.analyze(request_for(&h, &["fever"])).await.unwrap();

        let hits = h
            .store
            .search_knowledge(&["fever".into()], AgeGroup::Adult, Gender::Female)
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].diagnosis, "Dengue fever (suspected)");
        assert_eq!(hits[0].confidence, 80);
        assert_eq!(hits[0].age_group, AgeGroup::Adult);
    }

    #[tokio::test]
    async fn confidences_are_clamped_on_normalization() {
        let mut overconfident = online_diagnosis();
        overconfident.differential_diagnoses[0].confidence = 150;

        let h = harness(
            MockBackend::responding(overconfident),
            MockBackend::responding(fallback_diagnosis()),
        );

        let resolved = h.resolver.analyze(request_for(&h, &["fever"])).await.unwrap();
        assert_eq!(resolved.result.differential_diagnoses[0].confidence, 100);
        assert_eq!(
            resolved.record.unwrap().differential_diagnoses[0].confidence,
            100,
        );
    }

    #[tokio::test]
    async fn fallback_snippets_surface_but_are_not_persisted() {
        let h = harness(
            MockBackend::failing(BackendError::Http {
                status: 502,
                body: String::new(),
            }),
            MockBackend::responding(fallback_diagnosis()),
        );

        let resolved = h.resolver.analyze(request_for(&h, &["fever"])).await.unwrap();

        assert_eq!(resolved.knowledge_snippets.len(), 1);
        assert_eq!(resolved.knowledge_snippets[0].id, "kb-001");
        // The stored diagnosis has no snippet column at all; the ride-along
        // list is display-only.
        assert!(resolved.record.is_some());
    }

    #[tokio::test]
    async fn unknown_patient_surfaces_as_record_error() {
        let h = harness(
            MockBackend::responding(online_diagnosis()),
            MockBackend::responding(fallback_diagnosis()),
        );

        let mut request = request_for(&h, &["fever"]);
        request.patient_id = Some(Uuid::new_v4());

        let err = h.resolver.analyze(request).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Record(_)));
    }
}
