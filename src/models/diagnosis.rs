use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Language;
use super::vital_signs::VitalSigns;

/// One alternative explanation for the presenting symptoms.
///
/// Ordering within a diagnosis is descending confidence by convention of
/// the producing backend; the resolver does not re-sort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifferentialDiagnosis {
    pub condition: String,
    pub confidence: u8,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

/// Suggested management plan attached to a diagnosis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentProtocol {
    #[serde(default)]
    pub medications: Vec<TreatmentMedication>,
    #[serde(default)]
    pub procedures: Vec<String>,
    #[serde(default)]
    pub lifestyle: Vec<String>,
}

impl TreatmentProtocol {
    pub fn is_empty(&self) -> bool {
        self.medications.is_empty() && self.procedures.is_empty() && self.lifestyle.is_empty()
    }
}

/// A persisted diagnosis narrative. Created only by the resolver after a
/// backend call succeeds; never mutated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub vital_signs: Option<VitalSigns>,
    pub primary_diagnosis: String,
    pub differential_diagnoses: Vec<DifferentialDiagnosis>,
    #[serde(default)]
    pub treatment_protocol: Option<TreatmentProtocol>,
    pub requires_referral: bool,
    #[serde(default)]
    pub referral_reason: Option<String>,
    #[serde(default)]
    pub language: Language,
    pub created_at: DateTime<Utc>,
}

/// Fields for a diagnosis about to be persisted. Id and timestamp are
/// assigned by the record store.
#[derive(Debug, Clone)]
pub struct NewDiagnosis {
    pub patient_id: Uuid,
    pub symptoms: Vec<String>,
    pub vital_signs: Option<VitalSigns>,
    pub primary_diagnosis: String,
    pub differential_diagnoses: Vec<DifferentialDiagnosis>,
    pub treatment_protocol: Option<TreatmentProtocol>,
    pub requires_referral: bool,
    pub referral_reason: Option<String>,
    pub language: Language,
}
