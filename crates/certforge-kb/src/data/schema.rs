//! Schema gate for ingestion payloads and generative output
//!
//! One validator parameterized by a required-field list replaces the
//! near-duplicate per-type checks; each payload kind pins its field list
//! as a constant here.

use serde_json::Value;

use crate::data::errors::CoreError;

/// Required fields of a certification ingestion payload.
pub const CERTIFICATION_REQUIRED_FIELDS: &[&str] =
    &["certificationCode", "certificationName", "skillsMeasured"];

/// Required fields of a standalone service-record ingestion payload.
pub const SERVICE_RECORD_REQUIRED_FIELDS: &[&str] = &[
    "certificationCode",
    "certificationName",
    "skillName",
    "topicName",
    "serviceName",
];

/// Required fields of a generative project-idea response.
pub const PROJECT_IDEA_REQUIRED_FIELDS: &[&str] = &["title", "description"];

/// Checks that `payload` is a JSON object carrying every field in
/// `required`, treating explicit null as absent. Returns a
/// `SchemaViolation` naming all missing fields at once so the caller
/// sees the full gap, not just the first.
pub fn validate_required_fields(payload: &Value, required: &[&str]) -> Result<(), CoreError> {
    let object = payload
        .as_object()
        .ok_or_else(|| CoreError::validation("payload is not a JSON object"))?;

    let missing: Vec<String> = required
        .iter()
        .filter(|field| object.get(**field).map_or(true, Value::is_null))
        .map(|field| (*field).to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::schema_violation(missing))
    }
}
