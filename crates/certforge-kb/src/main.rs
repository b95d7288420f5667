use std::sync::Arc;

use dotenv::dotenv;
use serde_json::json;
use tokio::sync::mpsc;

use certforge_kb::{
    data::documents::CERT_VECTOR_COLLECTION,
    embedding::{create_embedding_generator, EmbeddingServiceConfig, DEFAULT_EMBEDDING_DIMENSION},
    generation::{create_completion_generator, CompletionServiceConfig},
    services::{
        client::KbClient,
        ingestion::IngestionService,
        messages::{IngestionRequest, IngestionResultSender, RecommendationRequest, RecommendationResultSender},
        recommendation::RecommendationService,
    },
    storage::MemoryDocumentStore,
    traits::{DistanceMetric, DocumentStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    certforge_kb::init_tracing();

    // Create channels for service communication
    let (ingestion_tx, ingestion_rx) =
        mpsc::channel::<(IngestionRequest, IngestionResultSender)>(100);
    let (recommendation_tx, recommendation_rx) =
        mpsc::channel::<(RecommendationRequest, RecommendationResultSender)>(100);

    // Providers come from the environment: OpenAI when OPENAI_API_KEY is
    // set, deterministic mocks otherwise.
    let embedding_generator = create_embedding_generator(EmbeddingServiceConfig::default());
    let completion_generator = create_completion_generator(CompletionServiceConfig::default());
    let document_store = create_document_store().await?;

    // Create the services
    let mut ingestion_service = IngestionService::new(
        Arc::clone(&document_store),
        Arc::clone(&embedding_generator),
        ingestion_rx,
    );

    let mut recommendation_service = RecommendationService::new(
        Arc::clone(&document_store),
        Arc::clone(&embedding_generator),
        Arc::clone(&completion_generator),
        recommendation_rx,
    );

    // Create a client for the demo operations below
    let client = KbClient::new(ingestion_tx, recommendation_tx);

    // Spawn the services
    let ingestion_handle = tokio::spawn(async move {
        if let Err(e) = ingestion_service.run().await {
            tracing::error!("Ingestion service error: {:?}", e);
        }
    });

    let recommendation_handle = tokio::spawn(async move {
        if let Err(e) = recommendation_service.run().await {
            tracing::error!("Recommendation service error: {:?}", e);
        }
    });

    tracing::info!("Certification KB services started");

    // Ingest a small certification taxonomy
    let payload = sample_certification_payload();
    match client.ingest_certification(payload).await {
        Ok(output) => tracing::info!(
            records = output.service_records.len(),
            certification = %output.prompt_document.certification_code,
            "Certification ingested"
        ),
        Err(e) => tracing::error!("Certification ingestion failed: {:?}", e),
    }

    // Ask for a project idea targeting one skill of the certification
    let result = client
        .recommend_project(
            "AZ-900".to_string(),
            Some("Cloud Concepts".to_string()),
            None,
        )
        .await;
    match result {
        Ok(Some(idea)) => tracing::info!(title = %idea.title, "Recommended project idea"),
        Ok(None) => tracing::info!("No recommendation available for AZ-900"),
        Err(e) => tracing::error!("Recommendation failed: {:?}", e),
    }

    // Ask for a project idea from a free-standing concept
    let result = client.recommend_project_for_concept("Storage".to_string()).await;
    match result {
        Ok(Some(idea)) => tracing::info!(title = %idea.title, "Recommended concept project idea"),
        Ok(None) => tracing::info!("No recommendation available for the concept"),
        Err(e) => tracing::error!("Concept recommendation failed: {:?}", e),
    }

    // Dropping the client closes the channels and lets both services exit
    drop(client);
    let _ = tokio::join!(ingestion_handle, recommendation_handle);

    Ok(())
}

/// Picks the document store from the environment: Neo4j when NEO4J_URI is
/// set and the adapter is compiled in, the in-memory store otherwise.
async fn create_document_store() -> anyhow::Result<Arc<dyn DocumentStore>> {
    #[cfg(feature = "neo4rs")]
    if std::env::var("NEO4J_URI").is_ok() {
        use certforge_kb::adapters::{Neo4jConfig, Neo4jDocumentStore};

        let store = Neo4jDocumentStore::new(Neo4jConfig::from_env()).await?;
        store
            .ensure_vector_index(
                CERT_VECTOR_COLLECTION,
                DEFAULT_EMBEDDING_DIMENSION,
                DistanceMetric::default(),
            )
            .await?;
        return Ok(Arc::new(store));
    }

    tracing::info!(collection = CERT_VECTOR_COLLECTION, "Using in-memory document store");
    Ok(Arc::new(MemoryDocumentStore::new()))
}

fn sample_certification_payload() -> String {
    json!({
        "certificationCode": "AZ-900",
        "certificationName": "Azure Fundamentals",
        "skillsMeasured": [
            {
                "name": "Cloud Concepts",
                "percentage": "25-30%",
                "topics": [
                    {
                        "topicName": "Core Services",
                        "services": ["Compute", "Storage"]
                    }
                ]
            },
            {
                "name": "Security Basics",
                "percentage": "20-25%",
                "topics": [
                    {
                        "topicName": "Identity Management",
                        "services": ["Active Directory"]
                    }
                ]
            }
        ]
    })
    .to_string()
}
