//! Deterministic context sentences used as embedding input
//!
//! Pure templates: identical structured input always yields byte-identical
//! text, which is what makes re-embedding idempotent and the pipeline
//! testable against exact strings.

use crate::data::models::{Certification, ServiceRecord};

/// Per-service sentence naming certification, skill, topic and service.
pub fn service_context_sentence(record: &ServiceRecord) -> String {
    format!(
        "The {} {} certification includes the skill of {}. Within this skill, \
         there is a focus on the topic of {}, particularly through the use of \
         the service {}.",
        record.certification_code,
        record.certification_name,
        record.skill_name,
        record.topic_name,
        record.service_name,
    )
}

/// Per-certification aggregate sentence enumerating all skill names.
pub fn certification_context_sentence(certification: &Certification) -> String {
    let skills: Vec<&str> = certification
        .skills_measured
        .iter()
        .map(|skill| skill.name.as_str())
        .collect();
    format!(
        "The {} {} certification includes the following skills: {}.",
        certification.certification_code,
        certification.certification_name,
        skills.join(", "),
    )
}

/// Query sentence embedded when a recommendation targets a certification
/// skill directly.
pub fn certification_query_sentence(certification_code: &str, skill: &str) -> String {
    format!(
        "I need a project idea for the certification exam {} for the skill {}",
        certification_code, skill,
    )
}

/// Query sentence embedded for concept-based recommendations.
pub fn concept_query_sentence(concept: &str) -> String {
    format!(
        "I need a project idea for the cloud engineering concept exam {}",
        concept,
    )
}
