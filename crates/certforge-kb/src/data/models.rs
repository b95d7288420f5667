//! Taxonomy input types and the flattened per-service record

use serde::{Deserialize, Serialize};

/// A certification as delivered by the ingestion source: a tree of
/// skills, topics and service names. Wire format is camelCase JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub certification_code: String,
    pub certification_name: String,
    pub skills_measured: Vec<Skill>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: String,
    /// Exam weight label, e.g. "25-30%". Carried through untouched.
    #[serde(default)]
    pub percentage: Option<String>,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub topic_name: String,
    pub services: Vec<String>,
}

/// One (skill, topic, service) triple flattened out of a certification tree.
/// Transient: produced and consumed within a single ingestion pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub certification_code: String,
    pub certification_name: String,
    pub skill_name: String,
    pub topic_name: String,
    pub service_name: String,
}

impl ServiceRecord {
    /// Composite key identifying exactly one (certification, service)
    /// embedding document.
    pub fn composite_key(&self) -> String {
        format!("{}-{}", self.certification_code, self.service_name)
    }
}
