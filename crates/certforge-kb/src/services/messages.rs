//! Message types for service communication

use tokio::sync::oneshot;

use crate::data::{
    CertificationIngestOutput, CoreError, EmbeddingDocument, InvocationContext, ProjectIdea,
};

/// Message type for ingestion operations
#[derive(Debug)]
pub enum IngestionRequest {
    /// A raw certification-tree payload: schema gate, flatten, embed every
    /// record, and persist the aggregate prompt document.
    Certification {
        ctx: InvocationContext,
        payload: String,
    },
    /// A raw standalone service-record payload: schema gate, build the
    /// context sentence, embed, and persist one embedding document.
    ServiceRecord {
        ctx: InvocationContext,
        payload: String,
    },
}

/// Response type for ingestion operations
#[derive(Debug)]
pub enum IngestionResponse {
    Certification(CertificationIngestOutput),
    ServiceRecord(EmbeddingDocument),
    Error(CoreError),
}

/// Wrapper for the oneshot sender to return ingestion results
#[derive(Debug)]
pub struct IngestionResultSender {
    pub sender: oneshot::Sender<IngestionResponse>,
}

/// Request type for recommendation queries
#[derive(Debug)]
pub enum RecommendationRequest {
    /// Recommend for a certification, optionally narrowed to a skill and
    /// topic. Without a skill the stored prompt vector drives retrieval.
    FromCertification {
        ctx: InvocationContext,
        certification_code: String,
        skill: Option<String>,
        topic: Option<String>,
    },
    /// Recommend for a free-standing cloud engineering concept.
    FromConcept {
        ctx: InvocationContext,
        concept: String,
    },
}

/// Response type for recommendation queries
#[derive(Debug)]
pub enum RecommendationResponse {
    Idea(ProjectIdea),
    /// Expected-absence outcome: nothing retrievable for the selector.
    NoRecommendation,
    Error(CoreError),
}

/// Wrapper for the oneshot sender to return recommendation results
#[derive(Debug)]
pub struct RecommendationResultSender {
    pub sender: oneshot::Sender<RecommendationResponse>,
}
