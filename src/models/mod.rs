pub mod diagnosis;
pub mod enums;
pub mod knowledge;
pub mod patient;
pub mod vital_signs;

pub use diagnosis::{
    Diagnosis, DifferentialDiagnosis, NewDiagnosis, TreatmentMedication, TreatmentProtocol,
};
pub use knowledge::{KnowledgeBaseEntry, KnowledgeSnippet, NewKnowledgeEntry};
pub use patient::{NewPatient, Patient};
pub use vital_signs::VitalSigns;
