use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::Gender;
use crate::models::Patient;

use super::{parse_timestamp, parse_uuid};

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, age, gender, weight, contact, address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.age,
            patient.gender.as_str(),
            patient.weight,
            patient.contact,
            patient.address,
            patient.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, age, gender, weight, contact, address, created_at
             FROM patients WHERE id = ?1",
            params![id.to_string()],
            map_patient_row,
        )
        .optional()?;

    row.map(row_to_patient).transpose()
}

pub fn patient_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM patients WHERE id = ?1)",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// All patients, newest first.
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, age, gender, weight, contact, address, created_at
         FROM patients ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt.query_map([], map_patient_row)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(row_to_patient(row?)?);
    }
    Ok(patients)
}

type PatientRow = (
    String,
    String,
    i64,
    String,
    Option<f64>,
    Option<String>,
    Option<String>,
    String,
);

fn map_patient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn row_to_patient(row: PatientRow) -> Result<Patient, DatabaseError> {
    let (id, name, age, gender, weight, contact, address, created_at) = row;
    Ok(Patient {
        id: parse_uuid("id", &id)?,
        name,
        age: u8::try_from(age).map_err(|_| DatabaseError::InvalidColumn {
            column: "age".into(),
            reason: format!("age {age} out of range"),
        })?,
        gender: Gender::from_str(&gender)?,
        weight,
        contact,
        address,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}
