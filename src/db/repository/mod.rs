//! Row-level persistence for patients, diagnoses, and the knowledge base.
//!
//! Nested structures (symptom lists, vital signs, differentials, treatment
//! protocols) live in JSON text columns and pass through the explicit
//! helpers below, so a malformed stored value surfaces as a typed error
//! on read instead of deserializing into an untyped blob.

pub mod diagnosis;
pub mod knowledge;
pub mod patient;

pub use diagnosis::*;
pub use knowledge::*;
pub use patient::*;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::DatabaseError;

/// Serialize a nested structure into a JSON text column.
pub(crate) fn to_json_column<T: Serialize>(column: &str, value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::InvalidColumn {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

/// Deserialize a JSON text column back into its typed shape.
pub(crate) fn from_json_column<T: DeserializeOwned>(
    column: &str,
    raw: &str,
) -> Result<T, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::InvalidColumn {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an RFC 3339 timestamp column.
pub(crate) fn parse_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::InvalidColumn {
            column: column.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a UUID column.
pub(crate) fn parse_uuid(column: &str, raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::InvalidColumn {
        column: column.to_string(),
        reason: e.to_string(),
    })
}
