use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::Language;
use crate::models::{Diagnosis, DifferentialDiagnosis, TreatmentProtocol, VitalSigns};

use super::{from_json_column, parse_timestamp, parse_uuid, to_json_column};

pub fn insert_diagnosis(conn: &Connection, diag: &Diagnosis) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO diagnoses (id, patient_id, symptoms, vital_signs, primary_diagnosis,
                                differential_diagnoses, treatment_protocol, requires_referral,
                                referral_reason, language, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            diag.id.to_string(),
            diag.patient_id.to_string(),
            to_json_column("symptoms", &diag.symptoms)?,
            diag.vital_signs
                .as_ref()
                .map(|v| to_json_column("vital_signs", v))
                .transpose()?,
            diag.primary_diagnosis,
            to_json_column("differential_diagnoses", &diag.differential_diagnoses)?,
            diag.treatment_protocol
                .as_ref()
                .map(|t| to_json_column("treatment_protocol", t))
                .transpose()?,
            diag.requires_referral,
            diag.referral_reason,
            diag.language.as_str(),
            diag.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

const DIAGNOSIS_COLUMNS: &str = "id, patient_id, symptoms, vital_signs, primary_diagnosis,
    differential_diagnoses, treatment_protocol, requires_referral, referral_reason,
    language, created_at";

pub fn get_diagnosis(conn: &Connection, id: &Uuid) -> Result<Option<Diagnosis>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE id = ?1"),
            params![id.to_string()],
            map_diagnosis_row,
        )
        .optional()?;

    row.map(row_to_diagnosis).transpose()
}

/// All diagnoses, newest first.
pub fn list_diagnoses(conn: &Connection) -> Result<Vec<Diagnosis>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map([], map_diagnosis_row)?;
    diagnosis_rows_to_vec(rows)
}

/// One patient's diagnoses, newest first.
pub fn list_diagnoses_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Diagnosis>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses
         WHERE patient_id = ?1 ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], map_diagnosis_row)?;
    diagnosis_rows_to_vec(rows)
}

type DiagnosisRow = (
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    Option<String>,
    bool,
    Option<String>,
    String,
    String,
);

fn map_diagnosis_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DiagnosisRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn diagnosis_rows_to_vec(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<DiagnosisRow>>,
) -> Result<Vec<Diagnosis>, DatabaseError> {
    let mut diagnoses = Vec::new();
    for row in rows {
        diagnoses.push(row_to_diagnosis(row?)?);
    }
    Ok(diagnoses)
}

fn row_to_diagnosis(row: DiagnosisRow) -> Result<Diagnosis, DatabaseError> {
    let (
        id,
        patient_id,
        symptoms,
        vital_signs,
        primary_diagnosis,
        differential_diagnoses,
        treatment_protocol,
        requires_referral,
        referral_reason,
        language,
        created_at,
    ) = row;

    Ok(Diagnosis {
        id: parse_uuid("id", &id)?,
        patient_id: parse_uuid("patient_id", &patient_id)?,
        symptoms: from_json_column::<Vec<String>>("symptoms", &symptoms)?,
        vital_signs: vital_signs
            .map(|v| from_json_column::<VitalSigns>("vital_signs", &v))
            .transpose()?,
        primary_diagnosis,
        differential_diagnoses: from_json_column::<Vec<DifferentialDiagnosis>>(
            "differential_diagnoses",
            &differential_diagnoses,
        )?,
        treatment_protocol: treatment_protocol
            .map(|t| from_json_column::<TreatmentProtocol>("treatment_protocol", &t))
            .transpose()?,
        requires_referral,
        referral_reason,
        language: Language::from_str(&language)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}
