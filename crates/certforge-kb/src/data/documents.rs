//! Stored document shapes and the project-idea output schema

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::models::ServiceRecord;

/// Collection holding one embedding document per (certification, service).
pub const CERT_VECTOR_COLLECTION: &str = "certvectors";

/// Collection holding one prompt document per certification.
pub const PROJECT_PROMPT_COLLECTION: &str = "projectpromptvectors";

/// Embedding document persisted for each flattened service record.
/// Upsert key is the composite key, so re-ingestion overwrites in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingDocument {
    pub id: Uuid,
    pub composite_key: String,
    pub certification_code: String,
    pub certification_name: String,
    pub skill_name: String,
    pub topic_name: String,
    pub service_name: String,
    pub sentence: String,
    pub vector: Vec<f32>,
}

impl EmbeddingDocument {
    pub fn from_record(record: &ServiceRecord, sentence: String, vector: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            composite_key: record.composite_key(),
            certification_code: record.certification_code.clone(),
            certification_name: record.certification_name.clone(),
            skill_name: record.skill_name.clone(),
            topic_name: record.topic_name.clone(),
            service_name: record.service_name.clone(),
            sentence,
            vector,
        }
    }
}

/// Aggregate prompt document persisted once per certification, keyed by the
/// certification code. Its vector drives skill-less recommendation queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPromptDocument {
    pub id: Uuid,
    pub certification_code: String,
    pub certification_name: String,
    pub sentence: String,
    pub vector: Vec<f32>,
}

/// The strict output schema every recommendation must satisfy.
/// `steps` defaults to an empty list rather than being absent; `resources`
/// is always derived, never model-supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectIdea {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
}

/// Output of a certification-level ingestion: the flattened records, the
/// persisted prompt document, and the raw payload passed through unmodified
/// so the triggering layer can archive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationIngestOutput {
    pub service_records: Vec<ServiceRecord>,
    pub prompt_document: ProjectPromptDocument,
    pub archived_payload: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ServiceRecord {
        ServiceRecord {
            certification_code: "AZ-900".into(),
            certification_name: "Azure Fundamentals".into(),
            skill_name: "Cloud Concepts".into(),
            topic_name: "Core Services".into(),
            service_name: "Storage".into(),
        }
    }

    #[test]
    fn test_embedding_document_from_record() {
        let document = EmbeddingDocument::from_record(
            &sample_record(),
            "a sentence".into(),
            vec![0.1, 0.2],
        );
        assert_eq!(document.composite_key, "AZ-900-Storage");
        assert_eq!(document.service_name, "Storage");
        assert_eq!(document.vector, vec![0.1, 0.2]);
    }

    #[test]
    fn test_embedding_document_wire_format() {
        let document = EmbeddingDocument::from_record(
            &sample_record(),
            "a sentence".into(),
            vec![0.5],
        );
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["compositeKey"], "AZ-900-Storage");
        assert_eq!(value["certificationCode"], "AZ-900");
        assert_eq!(value["topicName"], "Core Services");
        assert!(value["vector"].is_array());
    }

    #[test]
    fn test_project_idea_steps_default_to_empty() {
        let idea: ProjectIdea =
            serde_json::from_str(r#"{"title": "T", "description": "D"}"#).unwrap();
        assert!(idea.steps.is_empty());
        assert!(idea.resources.is_empty());
    }
}
