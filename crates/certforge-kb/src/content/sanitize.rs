//! Response sanitizer and validator
//!
//! The most failure-prone stage of the pipeline: it depends on an external
//! model following instructions. Raw text is repaired and validated in
//! sequence, and every failure surfaces as a typed error.

use serde_json::Value;

use crate::data::documents::ProjectIdea;
use crate::data::errors::CoreError;
use crate::data::schema::{validate_required_fields, PROJECT_IDEA_REQUIRED_FIELDS};

/// Strips a leading ```json (or bare ```) fence and a trailing ``` fence,
/// along with surrounding whitespace. Text without fences passes through
/// trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_prefix = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed)
        .trim_start();
    without_prefix
        .strip_suffix("```")
        .map(str::trim_end)
        .unwrap_or(without_prefix)
}

/// Builds the deterministic resource link list: one search URL per
/// candidate service, with the topic and service name URL-encoded into a
/// fixed template.
pub fn resource_links(services: &[String], topic: &str) -> Vec<String> {
    services
        .iter()
        .map(|service| {
            format!(
                "https://learn.microsoft.com/search/?terms={}%20{}&category=Training",
                urlencoding::encode(topic),
                urlencoding::encode(service),
            )
        })
        .collect()
}

/// Repairs and validates raw generative output into a `ProjectIdea`.
///
/// Stages: strip code fences, parse as JSON (`MalformedOutput` on failure),
/// gate required fields (`SchemaViolation` naming what is missing),
/// deserialize with absent `steps` normalized to an empty list, then append
/// the derived resource links. Never returns a partially populated idea.
pub fn sanitize_project_idea(
    raw: &str,
    services: &[String],
    topic: &str,
) -> Result<ProjectIdea, CoreError> {
    let cleaned = strip_code_fences(raw);

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| CoreError::MalformedOutput(e.to_string()))?;

    validate_required_fields(&value, PROJECT_IDEA_REQUIRED_FIELDS)?;

    let mut idea: ProjectIdea = serde_json::from_value(value)
        .map_err(|e| CoreError::MalformedOutput(e.to_string()))?;

    idea.resources = resource_links(services, topic);
    Ok(idea)
}
