//! Record store — the CRUD façade over patients, diagnoses, and the
//! knowledge base.
//!
//! An explicitly constructed storage handle (no global singleton): the
//! store owns its `rusqlite::Connection` behind a mutex and is shared
//! via `Arc`. Tests construct one over an in-memory database.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::enums::{AgeGroup, Gender};
use crate::models::{
    Diagnosis, KnowledgeBaseEntry, NewDiagnosis, NewKnowledgeEntry, NewPatient, Patient,
};
use crate::validation::{self, FieldError};

/// Errors from record store operations.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("Internal lock error")]
    LockPoisoned,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub struct RecordStore {
    conn: Mutex<Connection>,
}

impl RecordStore {
    /// Wrap an already-opened connection (migrations applied).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open the database file at `path` and run migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(db::open_database(path)?))
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(db::open_memory_database()?))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RecordError> {
        self.conn.lock().map_err(|_| RecordError::LockPoisoned)
    }

    // ── Patients ────────────────────────────────────────────

    /// Validate intake fields, assign id + timestamp, persist.
    pub fn create_patient(&self, new: NewPatient) -> Result<Patient, RecordError> {
        let errors = validation::validate_new_patient(&new);
        if !errors.is_empty() {
            return Err(RecordError::Validation(errors));
        }

        let patient = Patient {
            id: Uuid::new_v4(),
            name: new.name,
            age: new.age,
            gender: new.gender,
            weight: new.weight,
            contact: new.contact,
            address: new.address,
            created_at: Utc::now(),
        };

        repository::insert_patient(&*self.conn()?, &patient)?;
        tracing::info!(patient_id = %patient.id, "Patient created");
        Ok(patient)
    }

    pub fn get_patient(&self, id: &Uuid) -> Result<Option<Patient>, RecordError> {
        Ok(repository::get_patient(&*self.conn()?, id)?)
    }

    /// All patients, newest first.
    pub fn list_patients(&self) -> Result<Vec<Patient>, RecordError> {
        Ok(repository::list_patients(&*self.conn()?)?)
    }

    // ── Diagnoses ───────────────────────────────────────────

    /// Persist a diagnosis. The referenced patient must exist.
    pub fn create_diagnosis(&self, new: NewDiagnosis) -> Result<Diagnosis, RecordError> {
        if new.symptoms.is_empty() {
            return Err(RecordError::Validation(vec![FieldError::new(
                "symptoms",
                "At least one symptom is required",
            )]));
        }

        let conn = self.conn()?;
        if !repository::patient_exists(&conn, &new.patient_id)? {
            return Err(DatabaseError::NotFound {
                entity_type: "patient".into(),
                id: new.patient_id.to_string(),
            }
            .into());
        }

        let diagnosis = Diagnosis {
            id: Uuid::new_v4(),
            patient_id: new.patient_id,
            symptoms: new.symptoms,
            vital_signs: new.vital_signs,
            primary_diagnosis: new.primary_diagnosis,
            differential_diagnoses: new.differential_diagnoses,
            treatment_protocol: new.treatment_protocol,
            requires_referral: new.requires_referral,
            referral_reason: new.referral_reason,
            language: new.language,
            created_at: Utc::now(),
        };

        repository::insert_diagnosis(&conn, &diagnosis)?;
        tracing::info!(
            diagnosis_id = %diagnosis.id,
            patient_id = %diagnosis.patient_id,
            "Diagnosis recorded"
        );
        Ok(diagnosis)
    }

    pub fn get_diagnosis(&self, id: &Uuid) -> Result<Option<Diagnosis>, RecordError> {
        Ok(repository::get_diagnosis(&*self.conn()?, id)?)
    }

    /// All diagnoses, newest first.
    pub fn list_diagnoses(&self) -> Result<Vec<Diagnosis>, RecordError> {
        Ok(repository::list_diagnoses(&*self.conn()?)?)
    }

    /// One patient's diagnoses, newest first.
    pub fn list_diagnoses_for_patient(
        &self,
        patient_id: &Uuid,
    ) -> Result<Vec<Diagnosis>, RecordError> {
        Ok(repository::list_diagnoses_for_patient(
            &*self.conn()?,
            patient_id,
        )?)
    }

    // ── Knowledge base ──────────────────────────────────────

    /// Append an anonymized entry. No dedup.
    pub fn add_knowledge_entry(
        &self,
        new: NewKnowledgeEntry,
    ) -> Result<KnowledgeBaseEntry, RecordError> {
        let entry = KnowledgeBaseEntry {
            id: Uuid::new_v4(),
            symptoms: new.symptoms,
            age_group: new.age_group,
            gender: new.gender,
            diagnosis: new.diagnosis,
            confidence: new.confidence.min(100),
            outcome: None,
            created_at: Utc::now(),
        };

        repository::insert_knowledge_entry(&*self.conn()?, &entry)?;
        Ok(entry)
    }

    /// Fuzzy knowledge lookup; see `repository::search_knowledge`.
    pub fn search_knowledge(
        &self,
        symptoms: &[String],
        age_group: AgeGroup,
        gender: Gender,
    ) -> Result<Vec<KnowledgeBaseEntry>, RecordError> {
        Ok(repository::search_knowledge(
            &*self.conn()?,
            symptoms,
            age_group,
            gender,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RecordStore {
        RecordStore::in_memory().unwrap()
    }

    fn intake(name: &str, age: u8, gender: Gender) -> NewPatient {
        NewPatient {
            name: name.into(),
            age,
            gender,
            weight: None,
            contact: None,
            address: None,
        }
    }

    fn diagnosis_for(patient_id: Uuid, symptoms: &[&str]) -> NewDiagnosis {
        NewDiagnosis {
            patient_id,
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            vital_signs: None,
            primary_diagnosis: "Acute febrile illness (likely viral)".into(),
            differential_diagnoses: vec![],
            treatment_protocol: None,
            requires_referral: false,
            referral_reason: None,
            language: Default::default(),
        }
    }

    #[test]
    fn create_then_get_patient_round_trips() {
        let store = store();
        let created = store
            .create_patient(intake("A", 30, Gender::Male))
            .unwrap();

        let fetched = store.get_patient(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.name, "A");
        assert_eq!(fetched.age, 30);
    }

    #[test]
    fn get_unknown_patient_is_none() {
        assert!(store().get_patient(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn invalid_patient_is_rejected_with_field_errors() {
        let err = store()
            .create_patient(intake("", 200, Gender::Other))
            .unwrap_err();
        match err {
            RecordError::Validation(fields) => {
                assert_eq!(fields.len(), 2);
                assert!(fields.iter().any(|f| f.field == "name"));
                assert!(fields.iter().any(|f| f.field == "age"));
            }
            other => panic!("Expected Validation, got: {other}"),
        }
    }

    #[test]
    fn patients_list_newest_first() {
        let store = store();
        let first = store.create_patient(intake("First", 20, Gender::Male)).unwrap();
        let second = store
            .create_patient(intake("Second", 40, Gender::Female))
            .unwrap();

        let listed = store.list_patients().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[test]
    fn diagnosis_requires_existing_patient() {
        let err = store()
            .create_diagnosis(diagnosis_for(Uuid::new_v4(), &["fever"]))
            .unwrap_err();
        match err {
            RecordError::Database(DatabaseError::NotFound { entity_type, .. }) => {
                assert_eq!(entity_type, "patient");
            }
            other => panic!("Expected NotFound, got: {other}"),
        }
    }

    #[test]
    fn diagnosis_requires_symptoms() {
        let store = store();
        let patient = store.create_patient(intake("A", 30, Gender::Male)).unwrap();
        let err = store
            .create_diagnosis(diagnosis_for(patient.id, &[]))
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
    }

    #[test]
    fn diagnosis_round_trips_nested_structures() {
        let store = store();
        let patient = store.create_patient(intake("A", 30, Gender::Male)).unwrap();

        let mut new = diagnosis_for(patient.id, &["fever", "cough"]);
        new.vital_signs = Some(crate::models::VitalSigns {
            temperature: Some(101.5),
            blood_pressure: Some("120/80".into()),
            ..Default::default()
        });
        new.differential_diagnoses = vec![crate::models::DifferentialDiagnosis {
            condition: "Viral infection".into(),
            confidence: 70,
            reasoning: Some("Common with simple fever in primary care.".into()),
        }];
        new.treatment_protocol = Some(crate::models::TreatmentProtocol {
            lifestyle: vec!["Encourage oral fluids and light clothing.".into()],
            ..Default::default()
        });

        let created = store.create_diagnosis(new).unwrap();
        let fetched = store.get_diagnosis(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.symptoms, vec!["fever", "cough"]);
        assert_eq!(fetched.differential_diagnoses[0].confidence, 70);
        assert_eq!(
            fetched.vital_signs.unwrap().blood_pressure.as_deref(),
            Some("120/80"),
        );
    }

    #[test]
    fn diagnoses_listed_per_patient_newest_first() {
        let store = store();
        let alice = store.create_patient(intake("Alice", 30, Gender::Female)).unwrap();
        let bob = store.create_patient(intake("Bob", 40, Gender::Male)).unwrap();

        let d1 = store.create_diagnosis(diagnosis_for(alice.id, &["fever"])).unwrap();
        let d2 = store.create_diagnosis(diagnosis_for(alice.id, &["cough"])).unwrap();
        store.create_diagnosis(diagnosis_for(bob.id, &["rash"])).unwrap();

        let for_alice = store.list_diagnoses_for_patient(&alice.id).unwrap();
        assert_eq!(for_alice.len(), 2);
        assert_eq!(for_alice[0].id, d2.id);
        assert_eq!(for_alice[1].id, d1.id);

        assert_eq!(store.list_diagnoses().unwrap().len(), 3);
    }

    #[test]
    fn knowledge_entry_confidence_is_clamped() {
        let store = store();
        let entry = store
            .add_knowledge_entry(NewKnowledgeEntry {
                symptoms: vec!["fever".into()],
                age_group: AgeGroup::Adult,
                gender: Gender::Male,
                diagnosis: "Viral infection".into(),
                confidence: 250,
            })
            .unwrap();
        assert_eq!(entry.confidence, 100);
        assert!(entry.outcome.is_none());
    }

    #[test]
    fn knowledge_search_filters_and_sorts() {
        let store = store();
        let add = |symptoms: &[&str], age_group, gender, confidence| {
            store
                .add_knowledge_entry(NewKnowledgeEntry {
                    symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
                    age_group,
                    gender,
                    diagnosis: "Viral infection".into(),
                    confidence,
                })
                .unwrap();
        };

        add(&["cough", "fever"], AgeGroup::Adult, Gender::Male, 60);
        add(&["fever"], AgeGroup::Adult, Gender::Other, 90);
        add(&["fever"], AgeGroup::Adult, Gender::Female, 95); // wrong gender
        add(&["fever"], AgeGroup::Child, Gender::Male, 99); // wrong age group
        add(&["rash"], AgeGroup::Adult, Gender::Male, 80); // no overlap

        let hits = store
            .search_knowledge(&["fever".into()], AgeGroup::Adult, Gender::Male)
            .unwrap();

        assert_eq!(hits.len(), 2);
        // Sorted by confidence descending; the wildcard-gender entry wins
        assert_eq!(hits[0].confidence, 90);
        assert_eq!(hits[0].gender, Gender::Other);
        // Partial overlap qualifies: ["cough","fever"] matches a "fever" query
        assert_eq!(hits[1].confidence, 60);
        assert_eq!(hits[1].symptoms, vec!["cough", "fever"]);
    }

    #[test]
    fn knowledge_search_overlap_is_case_insensitive() {
        let store = store();
        store
            .add_knowledge_entry(NewKnowledgeEntry {
                symptoms: vec!["Fever".into()],
                age_group: AgeGroup::Adult,
                gender: Gender::Male,
                diagnosis: "Viral infection".into(),
                confidence: 70,
            })
            .unwrap();

        let hits = store
            .search_knowledge(&["fever".into()], AgeGroup::Adult, Gender::Male)
            .unwrap();
        assert_eq!(hits.len(), 1);
    }
}
