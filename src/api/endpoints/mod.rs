pub mod analyze;
pub mod diagnoses;
pub mod health;
pub mod knowledge;
pub mod patients;
pub mod snapshot;

use uuid::Uuid;

use super::error::ApiError;

/// Parse a path id, mapping garbage to a 400 instead of a panic or an
/// opaque rejection.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid id: {raw}")))
}
