use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::{
    content::{
        certification_instruction, certification_query_sentence, concept_instruction,
        concept_query_sentence, sanitize_project_idea, SYSTEM_MESSAGE,
    },
    data::{
        CoreError, EmbeddingDocument, InvocationContext, ProjectIdea, ProjectPromptDocument,
        StoreError, CERT_VECTOR_COLLECTION, PROJECT_PROMPT_COLLECTION,
    },
    services::messages::{RecommendationRequest, RecommendationResponse, RecommendationResultSender},
    traits::{CompletionGenerator, DistanceMetric, DocumentStore, EmbeddingGenerator},
};

/// Number of nearest documents retrieved per recommendation query.
pub const DEFAULT_TOP_K: usize = 5;

/// Service responsible for answering project-idea queries: retrieve the
/// nearest embedding documents, compose a constrained instruction, invoke
/// the generative provider, and validate its output.
pub struct RecommendationService {
    document_store: Arc<dyn DocumentStore>,
    embedding_generator: Arc<dyn EmbeddingGenerator>,
    completion_generator: Arc<dyn CompletionGenerator>,
    metric: DistanceMetric,
    recommendation_rx: mpsc::Receiver<(RecommendationRequest, RecommendationResultSender)>,
}

impl RecommendationService {
    /// Creates a new RecommendationService instance with the provided
    /// dependencies and message channel. The distance metric is fixed here
    /// for the lifetime of the service so it never varies between queries.
    pub fn new(
        document_store: Arc<dyn DocumentStore>,
        embedding_generator: Arc<dyn EmbeddingGenerator>,
        completion_generator: Arc<dyn CompletionGenerator>,
        recommendation_rx: mpsc::Receiver<(RecommendationRequest, RecommendationResultSender)>,
    ) -> Self {
        Self {
            document_store,
            embedding_generator,
            completion_generator,
            metric: DistanceMetric::default(),
            recommendation_rx,
        }
    }

    /// Runs the service, processing requests from the channel.
    /// Each request is processed in a separate task to avoid blocking the channel.
    pub async fn run(&mut self) -> Result<(), CoreError> {
        info!("RecommendationService started");
        while let Some((req, sender)) = self.recommendation_rx.recv().await {
            let document_store = Arc::clone(&self.document_store);
            let embedding_generator = Arc::clone(&self.embedding_generator);
            let completion_generator = Arc::clone(&self.completion_generator);
            let metric = self.metric;

            tokio::spawn(async move {
                let result = match req {
                    RecommendationRequest::FromCertification {
                        ctx,
                        certification_code,
                        skill,
                        topic,
                    } => {
                        info!(
                            invocation_id = %ctx.invocation_id,
                            certification_code = %certification_code,
                            skill = ?skill,
                            "Processing certification recommendation request"
                        );

                        recommend_from_certification(
                            &document_store,
                            &embedding_generator,
                            &completion_generator,
                            &certification_code,
                            skill.as_deref(),
                            topic.as_deref(),
                            metric,
                            &ctx,
                        )
                        .await
                    }
                    RecommendationRequest::FromConcept { ctx, concept } => {
                        info!(
                            invocation_id = %ctx.invocation_id,
                            concept = %concept,
                            "Processing concept recommendation request"
                        );

                        recommend_from_concept(
                            &document_store,
                            &embedding_generator,
                            &completion_generator,
                            &concept,
                            metric,
                            &ctx,
                        )
                        .await
                    }
                };

                let response = match result {
                    Ok(Some(idea)) => RecommendationResponse::Idea(idea),
                    Ok(None) => RecommendationResponse::NoRecommendation,
                    Err(e) => RecommendationResponse::Error(e),
                };

                // It's OK if the client dropped the request (sender is closed)
                let _ = sender.sender.send(response);
            });
        }

        // Channel closed, service shutting down
        info!("RecommendationService channel closed, shutting down");
        Ok(())
    }

    /// Recommends a project idea for a certification, optionally narrowed to
    /// a skill and topic. This is a public method that can be called directly
    /// without going through the message channel.
    #[instrument(skip(self), fields(invocation_id = %ctx.invocation_id, certification_code = %certification_code))]
    pub async fn recommend_from_certification(
        &self,
        certification_code: &str,
        skill: Option<&str>,
        topic: Option<&str>,
        ctx: &InvocationContext,
    ) -> Result<Option<ProjectIdea>, CoreError> {
        recommend_from_certification(
            &self.document_store,
            &self.embedding_generator,
            &self.completion_generator,
            certification_code,
            skill,
            topic,
            self.metric,
            ctx,
        )
        .await
    }

    /// Recommends a project idea for a free-standing cloud engineering
    /// concept. This is a public method that can be called directly without
    /// going through the message channel.
    #[instrument(skip(self), fields(invocation_id = %ctx.invocation_id, concept = %concept))]
    pub async fn recommend_from_concept(
        &self,
        concept: &str,
        ctx: &InvocationContext,
    ) -> Result<Option<ProjectIdea>, CoreError> {
        recommend_from_concept(
            &self.document_store,
            &self.embedding_generator,
            &self.completion_generator,
            concept,
            self.metric,
            ctx,
        )
        .await
    }
}

/// Standalone function handling the certification recommendation path.
///
/// With a skill the query vector is embedded from the deterministic query
/// sentence; without one the certification's stored prompt vector is used
/// instead, and a missing prompt document means "no recommendation" rather
/// than an error.
#[instrument(skip(document_store, embedding_generator, completion_generator), fields(invocation_id = %ctx.invocation_id))]
async fn recommend_from_certification(
    document_store: &Arc<dyn DocumentStore>,
    embedding_generator: &Arc<dyn EmbeddingGenerator>,
    completion_generator: &Arc<dyn CompletionGenerator>,
    certification_code: &str,
    skill: Option<&str>,
    topic: Option<&str>,
    metric: DistanceMetric,
    ctx: &InvocationContext,
) -> Result<Option<ProjectIdea>, CoreError> {
    if certification_code.trim().is_empty() {
        return Err(CoreError::EmptyInput);
    }
    let skill = skill.filter(|s| !s.trim().is_empty());
    let topic = topic.filter(|t| !t.trim().is_empty());

    let query_vector = match skill {
        Some(skill) => {
            let sentence = certification_query_sentence(certification_code, skill);
            embedding_generator.generate_embedding(&sentence).await?
        }
        None => {
            let stored = document_store
                .get(PROJECT_PROMPT_COLLECTION, certification_code)
                .await?;
            let Some(value) = stored else {
                info!(
                    invocation_id = %ctx.invocation_id,
                    certification_code = %certification_code,
                    "No stored prompt vector for certification, nothing to recommend"
                );
                return Ok(None);
            };
            let prompt_document: ProjectPromptDocument = serde_json::from_value(value)
                .map_err(|e| {
                    StoreError::Mapping(format!("stored prompt document is malformed: {}", e))
                })?;
            prompt_document.vector
        }
    };

    let retrieved = retrieve_nearest(document_store, &query_vector, metric, ctx).await?;
    let Some(top) = retrieved.first() else {
        info!(
            invocation_id = %ctx.invocation_id,
            certification_code = %certification_code,
            "No embedding documents retrieved, nothing to recommend"
        );
        return Ok(None);
    };

    // Label fallbacks when the caller narrowed nothing down: the skills come
    // from every retrieved document, the topic from the best-ranked one.
    let skill_label = match skill {
        Some(skill) => skill.to_string(),
        None => dedup_in_rank_order(retrieved.iter().map(|d| d.skill_name.as_str())).join(", "),
    };
    let topic_label = topic.map(str::to_string).unwrap_or_else(|| top.topic_name.clone());
    let services = dedup_in_rank_order(retrieved.iter().map(|d| d.service_name.as_str()));

    let instruction = certification_instruction(&skill_label, &topic_label, &services);
    let raw = completion_generator.complete(SYSTEM_MESSAGE, &instruction).await?;
    let idea = sanitize_project_idea(&raw, &services, &topic_label)?;

    info!(
        invocation_id = %ctx.invocation_id,
        certification_code = %certification_code,
        title = %idea.title,
        "Produced project idea"
    );
    Ok(Some(idea))
}

/// Standalone function handling the concept recommendation path.
#[instrument(skip(document_store, embedding_generator, completion_generator), fields(invocation_id = %ctx.invocation_id))]
async fn recommend_from_concept(
    document_store: &Arc<dyn DocumentStore>,
    embedding_generator: &Arc<dyn EmbeddingGenerator>,
    completion_generator: &Arc<dyn CompletionGenerator>,
    concept: &str,
    metric: DistanceMetric,
    ctx: &InvocationContext,
) -> Result<Option<ProjectIdea>, CoreError> {
    if concept.trim().is_empty() {
        return Err(CoreError::EmptyInput);
    }

    let sentence = concept_query_sentence(concept);
    let query_vector = embedding_generator.generate_embedding(&sentence).await?;

    let retrieved = retrieve_nearest(document_store, &query_vector, metric, ctx).await?;
    if retrieved.is_empty() {
        info!(
            invocation_id = %ctx.invocation_id,
            concept = %concept,
            "No embedding documents retrieved, nothing to recommend"
        );
        return Ok(None);
    }

    let services = dedup_in_rank_order(retrieved.iter().map(|d| d.service_name.as_str()));

    let instruction = concept_instruction(concept, &services);
    let raw = completion_generator.complete(SYSTEM_MESSAGE, &instruction).await?;
    let idea = sanitize_project_idea(&raw, &services, concept)?;

    info!(
        invocation_id = %ctx.invocation_id,
        concept = %concept,
        title = %idea.title,
        "Produced project idea"
    );
    Ok(Some(idea))
}

/// Runs the top-K similarity query and maps the raw documents back into
/// typed embedding documents. A store row that no longer matches the
/// document shape is a mapping fault, not a silent skip.
async fn retrieve_nearest(
    document_store: &Arc<dyn DocumentStore>,
    query_vector: &[f32],
    metric: DistanceMetric,
    ctx: &InvocationContext,
) -> Result<Vec<EmbeddingDocument>, CoreError> {
    let scored = document_store
        .query_by_vector(CERT_VECTOR_COLLECTION, query_vector, DEFAULT_TOP_K, metric)
        .await?;

    debug!(
        invocation_id = %ctx.invocation_id,
        retrieved = scored.len(),
        "Similarity query completed"
    );

    scored
        .into_iter()
        .map(|scored_doc| {
            serde_json::from_value(scored_doc.document).map_err(|e| {
                StoreError::Mapping(format!("retrieved document is malformed: {}", e)).into()
            })
        })
        .collect()
}

/// First occurrence wins; later duplicates keep their better-ranked slot.
fn dedup_in_rank_order<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use tokio::sync::{mpsc, oneshot};
    use uuid::Uuid;

    use super::*;
    use crate::{
        data::ServiceRecord,
        storage::MemoryDocumentStore,
        test_utils::fakes::{FakeCompletionService, FakeEmbeddingService},
        test_utils::mocks::MockEmbeddingGenerator,
    };

    const IDEA_JSON: &str = r#"{
        "title": "Tiered Storage Archive",
        "description": "Archives blobs across access tiers.",
        "steps": ["Step 1: Create a storage account"]
    }"#;

    fn record(code: &str, skill: &str, topic: &str, service: &str) -> ServiceRecord {
        ServiceRecord {
            certification_code: code.to_string(),
            certification_name: "Azure Fundamentals".to_string(),
            skill_name: skill.to_string(),
            topic_name: topic.to_string(),
            service_name: service.to_string(),
        }
    }

    async fn seed_document(
        store: &Arc<MemoryDocumentStore>,
        record: &ServiceRecord,
        vector: Vec<f32>,
    ) {
        let document = crate::data::EmbeddingDocument::from_record(
            record,
            crate::content::service_context_sentence(record),
            vector,
        );
        store
            .upsert(
                CERT_VECTOR_COLLECTION,
                &document.composite_key,
                serde_json::to_value(&document).unwrap(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_recommend_with_skill_constrains_services_to_retrieved() {
        let store = Arc::new(MemoryDocumentStore::new());
        seed_document(
            &store,
            &record("AZ-900", "Cloud Concepts", "Core Services", "Compute"),
            vec![0.9, 0.1, 0.0, 0.0],
        )
        .await;
        seed_document(
            &store,
            &record("AZ-104", "Compute Administration", "Virtual Machines", "Compute"),
            vec![0.8, 0.2, 0.0, 0.0],
        )
        .await;
        seed_document(
            &store,
            &record("AZ-900", "Cloud Concepts", "Core Services", "Storage"),
            vec![0.0, 1.0, 0.0, 0.0],
        )
        .await;

        let embedder = Arc::new(FakeEmbeddingService::new());
        embedder.add_embedding(
            &certification_query_sentence("AZ-900", "Cloud Concepts"),
            vec![1.0, 0.0, 0.0, 0.0],
        );
        let completion = Arc::new(FakeCompletionService::new());
        completion.push_response(IDEA_JSON);

        let store_dyn: Arc<dyn DocumentStore> = store.clone();
        let embedder_dyn: Arc<dyn EmbeddingGenerator> = embedder.clone();
        let completion_dyn: Arc<dyn CompletionGenerator> = completion.clone();
        let ctx = InvocationContext::new_root();

        let idea = recommend_from_certification(
            &store_dyn,
            &embedder_dyn,
            &completion_dyn,
            "AZ-900",
            Some("Cloud Concepts"),
            None,
            DistanceMetric::Cosine,
            &ctx,
        )
        .await
        .unwrap()
        .expect("expected a recommendation");

        assert_eq!(idea.title, "Tiered Storage Archive");
        // Resources derive from the deduped retrieved services, best rank
        // first: Compute twice collapses to one slot ahead of Storage.
        assert_eq!(idea.resources.len(), 2);
        assert!(idea.resources[0].contains("Compute"));
        assert!(idea.resources[1].contains("Storage"));

        let calls = completion.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, SYSTEM_MESSAGE);
        assert!(calls[0].1.contains("utilize ONLY the following services: Compute, Storage"));
        assert!(calls[0].1.contains("skill: Cloud Concepts"));
        assert!(calls[0].1.contains("topic: Core Services"));
    }

    #[tokio::test]
    async fn test_recommend_empty_collection_returns_none() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(FakeEmbeddingService::new());
        let completion: Arc<dyn CompletionGenerator> = Arc::new(FakeCompletionService::new());
        let ctx = InvocationContext::new_root();

        let result = recommend_from_certification(
            &store,
            &embedder,
            &completion,
            "AZ-900",
            Some("Cloud Concepts"),
            None,
            DistanceMetric::Cosine,
            &ctx,
        )
        .await
        .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_recommend_without_skill_uses_stored_prompt_vector() {
        let store = Arc::new(MemoryDocumentStore::new());
        seed_document(
            &store,
            &record("AZ-900", "Cloud Concepts", "Core Services", "Storage"),
            vec![0.0, 1.0, 0.0, 0.0],
        )
        .await;
        seed_document(
            &store,
            &record("AZ-900", "Security Basics", "Identity", "Active Directory"),
            vec![1.0, 0.0, 0.0, 0.0],
        )
        .await;

        let prompt_document = ProjectPromptDocument {
            id: Uuid::new_v4(),
            certification_code: "AZ-900".to_string(),
            certification_name: "Azure Fundamentals".to_string(),
            sentence: "aggregate sentence".to_string(),
            vector: vec![0.1, 0.9, 0.0, 0.0],
        };
        store
            .upsert(
                PROJECT_PROMPT_COLLECTION,
                "AZ-900",
                serde_json::to_value(&prompt_document).unwrap(),
            )
            .await
            .unwrap();

        // The stored vector must drive retrieval, so the embedder gets no call.
        let mut mock = MockEmbeddingGenerator::new();
        mock.expect_generate_embedding().times(0);
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(mock);

        let completion = Arc::new(FakeCompletionService::new());
        completion.push_response(IDEA_JSON);
        let completion_dyn: Arc<dyn CompletionGenerator> = completion.clone();

        let store_dyn: Arc<dyn DocumentStore> = store.clone();
        let ctx = InvocationContext::new_root();

        let idea = recommend_from_certification(
            &store_dyn,
            &embedder,
            &completion_dyn,
            "AZ-900",
            None,
            None,
            DistanceMetric::Cosine,
            &ctx,
        )
        .await
        .unwrap()
        .expect("expected a recommendation");

        assert!(!idea.resources.is_empty());

        // Both retrieved skills aggregate into the instruction, nearest first.
        let calls = completion.calls();
        assert!(calls[0].1.contains("skill: Cloud Concepts, Security Basics"));
        assert!(calls[0].1.contains("topic: Core Services"));
    }

    #[tokio::test]
    async fn test_recommend_without_skill_and_no_stored_prompt_returns_none() {
        let store = Arc::new(MemoryDocumentStore::new());
        seed_document(
            &store,
            &record("AZ-900", "Cloud Concepts", "Core Services", "Storage"),
            vec![0.0, 1.0, 0.0, 0.0],
        )
        .await;

        let store_dyn: Arc<dyn DocumentStore> = store.clone();
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(FakeEmbeddingService::new());
        let completion: Arc<dyn CompletionGenerator> = Arc::new(FakeCompletionService::new());
        let ctx = InvocationContext::new_root();

        let result = recommend_from_certification(
            &store_dyn,
            &embedder,
            &completion,
            "AZ-900",
            None,
            None,
            DistanceMetric::Cosine,
            &ctx,
        )
        .await
        .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_recommend_rejects_blank_certification_code() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(FakeEmbeddingService::new());
        let completion: Arc<dyn CompletionGenerator> = Arc::new(FakeCompletionService::new());
        let ctx = InvocationContext::new_root();

        let err = recommend_from_certification(
            &store,
            &embedder,
            &completion,
            "  ",
            None,
            None,
            DistanceMetric::Cosine,
            &ctx,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CoreError::EmptyInput));
    }

    #[tokio::test]
    async fn test_recommend_from_concept() {
        let store = Arc::new(MemoryDocumentStore::new());
        seed_document(
            &store,
            &record("AZ-900", "Networking", "Connectivity", "Virtual Network"),
            vec![1.0, 0.0, 0.0, 0.0],
        )
        .await;

        let embedder = Arc::new(FakeEmbeddingService::new());
        embedder.add_embedding(&concept_query_sentence("Networking"), vec![1.0, 0.0, 0.0, 0.0]);
        let completion = Arc::new(FakeCompletionService::new());
        completion.push_response(IDEA_JSON);

        let store_dyn: Arc<dyn DocumentStore> = store.clone();
        let embedder_dyn: Arc<dyn EmbeddingGenerator> = embedder.clone();
        let completion_dyn: Arc<dyn CompletionGenerator> = completion.clone();
        let ctx = InvocationContext::new_root();

        let idea = recommend_from_concept(
            &store_dyn,
            &embedder_dyn,
            &completion_dyn,
            "Networking",
            DistanceMetric::Cosine,
            &ctx,
        )
        .await
        .unwrap()
        .expect("expected a recommendation");

        // Resource links search by the concept itself.
        assert!(idea.resources[0].contains("Networking"));
        assert!(idea.resources[0].contains("Virtual%20Network"));

        let calls = completion.calls();
        assert!(calls[0].1.contains("concept certification: Networking"));
        assert!(calls[0].1.contains("utilize ONLY the following services: Virtual Network"));
    }

    #[tokio::test]
    async fn test_malformed_completion_output_is_typed_and_retryable() {
        let store = Arc::new(MemoryDocumentStore::new());
        seed_document(
            &store,
            &record("AZ-900", "Cloud Concepts", "Core Services", "Storage"),
            vec![1.0, 0.0, 0.0, 0.0],
        )
        .await;

        let embedder = Arc::new(FakeEmbeddingService::new());
        embedder.add_embedding(
            &certification_query_sentence("AZ-900", "Cloud Concepts"),
            vec![1.0, 0.0, 0.0, 0.0],
        );
        let completion = Arc::new(FakeCompletionService::new());
        completion.push_response("I'd suggest building something with Storage!");

        let store_dyn: Arc<dyn DocumentStore> = store.clone();
        let embedder_dyn: Arc<dyn EmbeddingGenerator> = embedder.clone();
        let completion_dyn: Arc<dyn CompletionGenerator> = completion.clone();
        let ctx = InvocationContext::new_root();

        let err = recommend_from_certification(
            &store_dyn,
            &embedder_dyn,
            &completion_dyn,
            "AZ-900",
            Some("Cloud Concepts"),
            None,
            DistanceMetric::Cosine,
            &ctx,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CoreError::MalformedOutput(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_recommendation_service_run() {
        let store = Arc::new(MemoryDocumentStore::new());
        seed_document(
            &store,
            &record("AZ-900", "Cloud Concepts", "Core Services", "Storage"),
            vec![1.0, 0.0, 0.0, 0.0],
        )
        .await;

        let embedder = Arc::new(FakeEmbeddingService::new());
        embedder.add_embedding(
            &certification_query_sentence("AZ-900", "Cloud Concepts"),
            vec![1.0, 0.0, 0.0, 0.0],
        );
        let completion = Arc::new(FakeCompletionService::new());
        completion.push_response(IDEA_JSON);

        let (tx, rx) = mpsc::channel(10);
        let mut service = RecommendationService::new(store, embedder, completion, rx);

        let (result_tx, result_rx) = oneshot::channel();
        tx.send((
            RecommendationRequest::FromCertification {
                ctx: InvocationContext::new_root(),
                certification_code: "AZ-900".to_string(),
                skill: Some("Cloud Concepts".to_string()),
                topic: None,
            },
            RecommendationResultSender { sender: result_tx },
        ))
        .await
        .expect("Failed to send test request");

        drop(tx);

        let run_result = service.run().await;
        assert!(run_result.is_ok());

        match result_rx.await.expect("Response was dropped") {
            RecommendationResponse::Idea(idea) => {
                assert_eq!(idea.title, "Tiered Storage Archive");
            }
            other => panic!("Unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_dedup_preserves_rank_order() {
        let names = ["Compute", "Storage", "Compute", "Functions"];
        let deduped = dedup_in_rank_order(names.iter().copied());
        assert_eq!(deduped, vec!["Compute", "Storage", "Functions"]);
    }
}
