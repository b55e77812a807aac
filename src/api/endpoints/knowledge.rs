//! Knowledge-base search endpoint.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::models::enums::{AgeGroup, Gender};
use crate::models::KnowledgeBaseEntry;
use crate::state::AppState;
use crate::validation::FieldError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSearchQuery {
    /// Comma-separated symptom list.
    pub symptoms: String,
    pub age_group: String,
    pub gender: String,
}

fn parse_query(
    query: &KnowledgeSearchQuery,
) -> Result<(Vec<String>, AgeGroup, Gender), Vec<FieldError>> {
    let mut errors = Vec::new();

    let symptoms: Vec<String> = query
        .symptoms
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if symptoms.is_empty() {
        errors.push(FieldError::new(
            "symptoms",
            "At least one symptom is required",
        ));
    }

    let age_group = AgeGroup::from_str(&query.age_group)
        .map_err(|_| {
            errors.push(FieldError::new(
                "ageGroup",
                format!("Unknown age group: {}", query.age_group),
            ));
        })
        .ok();
    let gender = Gender::from_str(&query.gender)
        .map_err(|_| {
            errors.push(FieldError::new(
                "gender",
                format!("Unknown gender: {}", query.gender),
            ));
        })
        .ok();

    match (age_group, gender) {
        (Some(age_group), Some(gender)) if errors.is_empty() => {
            Ok((symptoms, age_group, gender))
        }
        _ => Err(errors),
    }
}

/// `GET /api/knowledge/search?symptoms=fever,cough&ageGroup=adult&gender=male`
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KnowledgeSearchQuery>,
) -> Result<Json<Vec<KnowledgeBaseEntry>>, ApiError> {
    let (symptoms, age_group, gender) =
        parse_query(&query).map_err(ApiError::Validation)?;

    let entries = state.store.search_knowledge(&symptoms, age_group, gender)?;
    Ok(Json(entries))
}
