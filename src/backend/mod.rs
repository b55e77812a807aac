//! Diagnosis backends — the pluggable services the resolver routes
//! between.
//!
//! Primary and fallback speak the same wire shape; the fallback may
//! additionally attach knowledge snippets. `HttpBackend` covers both
//! remote and locally-reachable services; `RuleEngine` is the embedded
//! in-process fallback used when no fallback URL is configured.

pub mod http;
pub mod rules;

pub use http::{HttpBackend, MockBackend};
pub use rules::RuleEngine;

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::{Gender, Language};
use crate::models::{DifferentialDiagnosis, KnowledgeSnippet, TreatmentProtocol, VitalSigns};

/// A structured symptom-analysis request. Doubles as the wire payload
/// sent to HTTP backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub vital_signs: Option<VitalSigns>,
    pub patient_age: u8,
    pub patient_gender: Gender,
    #[serde(default)]
    pub patient_weight: Option<f64>,
    #[serde(default)]
    pub language: Language,
}

/// A backend's diagnosis payload, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendDiagnosis {
    pub primary_diagnosis: String,
    #[serde(default)]
    pub differential_diagnoses: Vec<DifferentialDiagnosis>,
    #[serde(default)]
    pub treatment_protocol: Option<TreatmentProtocol>,
    #[serde(default)]
    pub requires_referral: bool,
    #[serde(default)]
    pub referral_reason: Option<String>,
    /// Supplementary guideline snippets; only fallback backends send
    /// these.
    #[serde(default)]
    pub knowledge_snippets: Vec<KnowledgeSnippet>,
}

/// Errors from a diagnosis backend call.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Cannot reach diagnosis backend at {0}")]
    Connection(String),
    #[error("Backend request timed out after {0}s")]
    Timeout(u64),
    #[error("Backend transport error: {0}")]
    Transport(String),
    #[error("Backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Cannot parse backend response: {0}")]
    ResponseParsing(String),
}

impl BackendError {
    /// Whether this failure suggests the network itself is down, as
    /// opposed to the backend misbehaving. Drives the connectivity
    /// monitor's offline transition.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Transport(_)
        )
    }
}

/// One diagnosis-generation service.
pub trait DiagnosisBackend: Send + Sync {
    /// Run one symptom analysis against this backend.
    fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> impl Future<Output = Result<BackendDiagnosis, BackendError>> + Send;
}

impl<B: DiagnosisBackend> DiagnosisBackend for Arc<B> {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<BackendDiagnosis, BackendError> {
        (**self).analyze(request).await
    }
}

/// The fallback slot: an HTTP service when one is configured, the
/// embedded rule engine otherwise.
pub enum FallbackBackend {
    Http(HttpBackend),
    Rules(RuleEngine),
}

impl DiagnosisBackend for FallbackBackend {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<BackendDiagnosis, BackendError> {
        match self {
            Self::Http(backend) => backend.analyze(request).await,
            Self::Rules(engine) => engine.analyze(request).await,
        }
    }
}
