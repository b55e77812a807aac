//! Boundary validation with structured, field-level errors.
//!
//! Request structs are typed, so validation here covers only what the
//! type system cannot express: value ranges and non-emptiness. Invoked
//! at the HTTP boundary and again by the record store before a write.

use serde::Serialize;

use crate::backend::AnalysisRequest;
use crate::models::NewPatient;

/// Maximum accepted age in years.
pub const MAX_AGE: u8 = 150;

/// Maximum accepted weight in kilograms.
pub const MAX_WEIGHT_KG: f64 = 500.0;

/// One field-level validation failure, surfaced verbatim in 400 bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate patient intake fields.
pub fn validate_new_patient(patient: &NewPatient) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if patient.name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required"));
    }
    if patient.age > MAX_AGE {
        errors.push(FieldError::new(
            "age",
            format!("Age must be between 0 and {MAX_AGE}"),
        ));
    }
    if let Some(weight) = patient.weight {
        if !(weight > 0.0 && weight <= MAX_WEIGHT_KG) {
            errors.push(FieldError::new(
                "weight",
                format!("Weight must be between 0 and {MAX_WEIGHT_KG} kg"),
            ));
        }
    }

    errors
}

/// Validate a symptom-analysis request. A malformed request is the only
/// hard error in the analyze flow, so this runs before any backend call.
pub fn validate_analysis_request(request: &AnalysisRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if request.patient_id.is_none() {
        errors.push(FieldError::new("patientId", "Patient id is required"));
    }
    if request.symptoms.is_empty() || request.symptoms.iter().all(|s| s.trim().is_empty()) {
        errors.push(FieldError::new(
            "symptoms",
            "At least one symptom is required",
        ));
    }
    if request.patient_age > MAX_AGE {
        errors.push(FieldError::new(
            "patientAge",
            format!("Age must be between 0 and {MAX_AGE}"),
        ));
    }
    if let Some(weight) = request.patient_weight {
        if !(weight > 0.0 && weight <= MAX_WEIGHT_KG) {
            errors.push(FieldError::new(
                "patientWeight",
                format!("Weight must be between 0 and {MAX_WEIGHT_KG} kg"),
            ));
        }
    }

    errors
}
