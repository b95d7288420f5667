//! Core data structures for the certification knowledge base

pub mod context;
pub mod documents;
pub mod errors;
pub mod models;
pub mod schema;

// Re-export all common types
pub use context::InvocationContext;
pub use documents::{
    CertificationIngestOutput, EmbeddingDocument, ProjectIdea, ProjectPromptDocument,
    CERT_VECTOR_COLLECTION, PROJECT_PROMPT_COLLECTION,
};
pub use errors::{CoreError, StoreError};
pub use models::{Certification, ServiceRecord, Skill, Topic};
pub use schema::{
    validate_required_fields, CERTIFICATION_REQUIRED_FIELDS, PROJECT_IDEA_REQUIRED_FIELDS,
    SERVICE_RECORD_REQUIRED_FIELDS,
};
