//! Certification Knowledge Base Core Implementation
//!
//! Ingests certification taxonomies into embedded service records, serves
//! vector similarity queries over them, and turns the retrieved context
//! into schema-validated project ideas.

// Core modules
pub mod content;
pub mod data;
pub mod embedding;
pub mod generation;
pub mod services;
pub mod storage;
pub mod traits;

// Implementation adapters (optional, can be provided externally)
#[cfg(feature = "adapters")]
pub mod adapters;

// Testing utilities - deterministic fakes plus feature-gated mocks
pub mod test_utils;

// Re-export key types for convenient usage
pub use data::context::InvocationContext;
pub use data::documents::{
    CertificationIngestOutput, EmbeddingDocument, ProjectIdea, ProjectPromptDocument,
    CERT_VECTOR_COLLECTION, PROJECT_PROMPT_COLLECTION,
};
pub use data::errors::{CoreError, StoreError};
pub use data::models::{Certification, ServiceRecord, Skill, Topic};
pub use data::schema::{
    validate_required_fields, CERTIFICATION_REQUIRED_FIELDS, PROJECT_IDEA_REQUIRED_FIELDS,
    SERVICE_RECORD_REQUIRED_FIELDS,
};

// Re-export core traits
pub use traits::{
    CompletionGenerator, DistanceMetric, DocumentStore, EmbeddingGenerator, ScoredDocument,
};

// Re-export deterministic content builders
pub use content::{
    certification_context_sentence, certification_instruction, certification_query_sentence,
    concept_instruction, concept_query_sentence, sanitize_project_idea, service_context_sentence,
    SYSTEM_MESSAGE,
};

// Re-export embedding services
#[cfg(feature = "async-openai")]
pub use embedding::OpenAIEmbeddingService;
pub use embedding::{
    create_embedding_generator, EmbeddingServiceConfig, MockEmbeddingService,
    DEFAULT_EMBEDDING_DIMENSION,
};

// Re-export completion services
#[cfg(feature = "async-openai")]
pub use generation::OpenAICompletionService;
pub use generation::{
    create_completion_generator, CompletionServiceConfig, MockCompletionService,
};

// Re-export document stores
pub use storage::MemoryDocumentStore;
#[cfg(all(feature = "adapters", feature = "neo4rs"))]
pub use adapters::{Neo4jConfig, Neo4jDocumentStore};

// Re-export core services
pub use services::{IngestionService, KbClient, RecommendationService, DEFAULT_TOP_K};

// Re-export message types
pub use services::messages::{
    IngestionRequest, IngestionResponse, IngestionResultSender, RecommendationRequest,
    RecommendationResponse, RecommendationResultSender,
};

/// Initialize tracing for the knowledge base system
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}
