use std::str::FromStr;

use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::enums::{AgeGroup, Gender};
use crate::models::KnowledgeBaseEntry;

use super::{from_json_column, parse_timestamp, parse_uuid, to_json_column};

pub fn insert_knowledge_entry(
    conn: &Connection,
    entry: &KnowledgeBaseEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO knowledge_base (id, symptoms, age_group, gender, diagnosis,
                                     confidence, outcome, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.id.to_string(),
            to_json_column("symptoms", &entry.symptoms)?,
            entry.age_group.as_str(),
            entry.gender.as_str(),
            entry.diagnosis,
            entry.confidence,
            entry.outcome,
            entry.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Recall-oriented fuzzy match over the knowledge base.
///
/// Age group must match exactly; gender must match exactly or the stored
/// entry is the wildcard `other`; the stored symptom set must intersect
/// the query set in at least one element (case-insensitive). Results
/// come back sorted by confidence descending.
pub fn search_knowledge(
    conn: &Connection,
    symptoms: &[String],
    age_group: AgeGroup,
    gender: Gender,
) -> Result<Vec<KnowledgeBaseEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, symptoms, age_group, gender, diagnosis, confidence, outcome, created_at
         FROM knowledge_base
         WHERE age_group = ?1 AND (gender = ?2 OR gender = 'other')
         ORDER BY confidence DESC, created_at DESC",
    )?;

    let rows = stmt.query_map(
        params![age_group.as_str(), gender.as_str()],
        map_knowledge_row,
    )?;

    let query: Vec<String> = symptoms.iter().map(|s| s.trim().to_lowercase()).collect();

    let mut entries = Vec::new();
    for row in rows {
        let entry = row_to_knowledge_entry(row?)?;
        let overlaps = entry
            .symptoms
            .iter()
            .any(|s| query.iter().any(|q| q == &s.trim().to_lowercase()));
        if overlaps {
            entries.push(entry);
        }
    }
    Ok(entries)
}

type KnowledgeRow = (
    String,
    String,
    String,
    String,
    String,
    i64,
    Option<String>,
    String,
);

fn map_knowledge_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<KnowledgeRow> {
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

fn row_to_knowledge_entry(row: KnowledgeRow) -> Result<KnowledgeBaseEntry, DatabaseError> {
    let (id, symptoms, age_group, gender, diagnosis, confidence, outcome, created_at) = row;
    Ok(KnowledgeBaseEntry {
        id: parse_uuid("id", &id)?,
        symptoms: from_json_column::<Vec<String>>("symptoms", &symptoms)?,
        age_group: AgeGroup::from_str(&age_group)?,
        gender: Gender::from_str(&gender)?,
        diagnosis,
        confidence: u8::try_from(confidence).map_err(|_| DatabaseError::InvalidColumn {
            column: "confidence".into(),
            reason: format!("confidence {confidence} out of range"),
        })?,
        outcome,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}
