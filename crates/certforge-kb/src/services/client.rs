use tokio::sync::{mpsc, oneshot};

use crate::data::{
    CertificationIngestOutput, CoreError, EmbeddingDocument, InvocationContext, ProjectIdea,
};
use crate::services::messages::{
    IngestionRequest, IngestionResponse, IngestionResultSender, RecommendationRequest,
    RecommendationResponse, RecommendationResultSender,
};

/// Client interface for interacting with the knowledge base services.
/// Provides a clean API for sending ingestion payloads and requesting
/// project recommendations.
#[derive(Clone)]
pub struct KbClient {
    ingestion_tx: mpsc::Sender<(IngestionRequest, IngestionResultSender)>,
    recommendation_tx: mpsc::Sender<(RecommendationRequest, RecommendationResultSender)>,
}

impl KbClient {
    /// Creates a new KbClient with the provided channel senders.
    pub fn new(
        ingestion_tx: mpsc::Sender<(IngestionRequest, IngestionResultSender)>,
        recommendation_tx: mpsc::Sender<(RecommendationRequest, RecommendationResultSender)>,
    ) -> Self {
        KbClient {
            ingestion_tx,
            recommendation_tx,
        }
    }

    /// Sends an ingestion request and awaits the response.
    pub async fn ingest(&self, request: IngestionRequest) -> Result<IngestionResponse, CoreError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.ingestion_tx
            .send((request, IngestionResultSender { sender: response_tx }))
            .await
            .map_err(|_| CoreError::Internal("Ingestion channel closed".to_string()))?;

        response_rx.await.map_err(|_| {
            CoreError::Internal("Ingestion response channel closed by service".to_string())
        })
    }

    /// Sends a recommendation request and awaits the response.
    pub async fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> Result<RecommendationResponse, CoreError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.recommendation_tx
            .send((request, RecommendationResultSender { sender: response_tx }))
            .await
            .map_err(|_| CoreError::Internal("Recommendation channel closed".to_string()))?;

        response_rx.await.map_err(|_| {
            CoreError::Internal("Recommendation response channel closed by service".to_string())
        })
    }

    /// Ingests a raw certification-tree payload and returns the flattened
    /// records plus the persisted prompt document.
    pub async fn ingest_certification(
        &self,
        payload: String,
    ) -> Result<CertificationIngestOutput, CoreError> {
        let request = IngestionRequest::Certification {
            ctx: InvocationContext::new_root(),
            payload,
        };
        match self.ingest(request).await? {
            IngestionResponse::Certification(output) => Ok(output),
            IngestionResponse::Error(e) => Err(e),
            other => Err(CoreError::Internal(format!(
                "Unexpected ingestion response: {:?}",
                other
            ))),
        }
    }

    /// Ingests a raw standalone service-record payload.
    pub async fn ingest_service_record(
        &self,
        payload: String,
    ) -> Result<EmbeddingDocument, CoreError> {
        let request = IngestionRequest::ServiceRecord {
            ctx: InvocationContext::new_root(),
            payload,
        };
        match self.ingest(request).await? {
            IngestionResponse::ServiceRecord(document) => Ok(document),
            IngestionResponse::Error(e) => Err(e),
            other => Err(CoreError::Internal(format!(
                "Unexpected ingestion response: {:?}",
                other
            ))),
        }
    }

    /// Requests a project idea for a certification, optionally narrowed to
    /// a skill and topic. `Ok(None)` means nothing was retrievable for the
    /// selector, which callers treat as "no recommendation".
    pub async fn recommend_project(
        &self,
        certification_code: String,
        skill: Option<String>,
        topic: Option<String>,
    ) -> Result<Option<ProjectIdea>, CoreError> {
        let request = RecommendationRequest::FromCertification {
            ctx: InvocationContext::new_root(),
            certification_code,
            skill,
            topic,
        };
        match self.recommend(request).await? {
            RecommendationResponse::Idea(idea) => Ok(Some(idea)),
            RecommendationResponse::NoRecommendation => Ok(None),
            RecommendationResponse::Error(e) => Err(e),
        }
    }

    /// Requests a project idea for a free-standing cloud engineering concept.
    pub async fn recommend_project_for_concept(
        &self,
        concept: String,
    ) -> Result<Option<ProjectIdea>, CoreError> {
        let request = RecommendationRequest::FromConcept {
            ctx: InvocationContext::new_root(),
            concept,
        };
        match self.recommend(request).await? {
            RecommendationResponse::Idea(idea) => Ok(Some(idea)),
            RecommendationResponse::NoRecommendation => Ok(None),
            RecommendationResponse::Error(e) => Err(e),
        }
    }
}
