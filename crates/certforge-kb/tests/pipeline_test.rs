//! End-to-end tests for the ingest-to-recommendation workflow
//!
//! Services run against the in-memory store and deterministic fakes, wired
//! through the same channels the binary uses.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

use certforge_kb::{
    content::{service_context_sentence, SYSTEM_MESSAGE},
    data::{
        documents::{CERT_VECTOR_COLLECTION, PROJECT_PROMPT_COLLECTION},
        errors::CoreError,
        models::ServiceRecord,
    },
    services::{
        client::KbClient,
        ingestion::IngestionService,
        messages::{
            IngestionRequest, IngestionResultSender, RecommendationRequest,
            RecommendationResultSender,
        },
        recommendation::RecommendationService,
    },
    storage::MemoryDocumentStore,
    test_utils::fakes::{FakeCompletionService, FakeEmbeddingService},
    traits::{CompletionGenerator, DocumentStore, EmbeddingGenerator},
};

const IDEA_RESPONSE: &str = r#"{
    "title": "Tiered Storage Archive",
    "description": "Archives infrequently accessed blobs into a cool tier on a schedule.",
    "steps": ["Step 1: Create a storage account", "Step 2: Add a lifecycle rule"]
}"#;

/// Starts both services over fresh channels and returns the client plus the
/// concrete fakes for seeding and inspection.
fn start_services() -> (
    KbClient,
    Arc<MemoryDocumentStore>,
    Arc<FakeEmbeddingService>,
    Arc<FakeCompletionService>,
) {
    let store = Arc::new(MemoryDocumentStore::new());
    let embedder = Arc::new(FakeEmbeddingService::new());
    let completions = Arc::new(FakeCompletionService::new());

    let store_dyn: Arc<dyn DocumentStore> = store.clone();
    let embedder_dyn: Arc<dyn EmbeddingGenerator> = embedder.clone();
    let completions_dyn: Arc<dyn CompletionGenerator> = completions.clone();

    let (ingestion_tx, ingestion_rx) =
        mpsc::channel::<(IngestionRequest, IngestionResultSender)>(100);
    let (recommendation_tx, recommendation_rx) =
        mpsc::channel::<(RecommendationRequest, RecommendationResultSender)>(100);

    let mut ingestion_service =
        IngestionService::new(Arc::clone(&store_dyn), Arc::clone(&embedder_dyn), ingestion_rx);
    let mut recommendation_service = RecommendationService::new(
        store_dyn,
        embedder_dyn,
        completions_dyn,
        recommendation_rx,
    );

    tokio::spawn(async move {
        if let Err(e) = ingestion_service.run().await {
            eprintln!("Ingestion service error: {:?}", e);
        }
    });
    tokio::spawn(async move {
        if let Err(e) = recommendation_service.run().await {
            eprintln!("Recommendation service error: {:?}", e);
        }
    });

    let client = KbClient::new(ingestion_tx, recommendation_tx);
    (client, store, embedder, completions)
}

fn az900_payload() -> String {
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

#[test_log::test(tokio::test)]
async fn test_certification_ingestion_persists_expected_documents() {
    let (client, store, _embedder, _completions) = start_services();
    let payload = az900_payload();

    let output = client
        .ingest_certification(payload.clone())
        .await
        .expect("ingestion should succeed");

    let keys: Vec<String> = output
        .service_records
        .iter()
        .map(|r| r.composite_key())
        .collect();
    assert_eq!(
        keys,
        vec!["AZ-900-Compute", "AZ-900-Storage", "AZ-900-Active Directory"],
        "Records should preserve skill, topic and service declaration order"
    );

    assert_eq!(store.collection_len(CERT_VECTOR_COLLECTION), 3);
    assert_eq!(store.collection_len(PROJECT_PROMPT_COLLECTION), 1);
    assert_eq!(output.archived_payload, payload);

    // Stored sentence matches the deterministic builder byte for byte
    let stored = store
        .get(CERT_VECTOR_COLLECTION, "AZ-900-Storage")
        .await
        .unwrap()
        .expect("storage record should exist");
    let expected_record = ServiceRecord {
        certification_code: "AZ-900".to_string(),
        certification_name: "Azure Fundamentals".to_string(),
        skill_name: "Cloud Concepts".to_string(),
        topic_name: "Core Services".to_string(),
        service_name: "Storage".to_string(),
    };
    assert_eq!(stored["sentence"], service_context_sentence(&expected_record));
    assert_eq!(stored["compositeKey"], "AZ-900-Storage");

    let prompt = store
        .get(PROJECT_PROMPT_COLLECTION, "AZ-900")
        .await
        .unwrap()
        .expect("prompt document should exist");
    let prompt_sentence = prompt["sentence"].as_str().unwrap();
    assert!(prompt_sentence.contains("Cloud Concepts, Security Basics"));
}

#[test_log::test(tokio::test)]
async fn test_reingestion_is_idempotent() {
    let (client, store, _embedder, _completions) = start_services();
    let payload = az900_payload();

    let first = client.ingest_certification(payload.clone()).await.unwrap();
    let second = client.ingest_certification(payload).await.unwrap();

    assert_eq!(store.collection_len(CERT_VECTOR_COLLECTION), 3);
    assert_eq!(store.collection_len(PROJECT_PROMPT_COLLECTION), 1);

    let first_keys: Vec<String> = first
        .service_records
        .iter()
        .map(|r| r.composite_key())
        .collect();
    let second_keys: Vec<String> = second
        .service_records
        .iter()
        .map(|r| r.composite_key())
        .collect();
    assert_eq!(first_keys, second_keys);
}

#[test_log::test(tokio::test)]
async fn test_skill_recommendation_is_constrained_to_retrieved_services() {
    let (client, store, _embedder, completions) = start_services();
    client.ingest_certification(az900_payload()).await.unwrap();
    completions.push_response(IDEA_RESPONSE);

    let idea = client
        .recommend_project(
            "AZ-900".to_string(),
            Some("Cloud Concepts".to_string()),
            None,
        )
        .await
        .expect("recommendation should succeed")
        .expect("an idea should be produced");

    assert_eq!(idea.title, "Tiered Storage Archive");
    assert_eq!(idea.steps.len(), 2);

    // One derived link per distinct retrieved service, never model-supplied
    assert_eq!(idea.resources.len(), 3);
    assert!(idea
        .resources
        .iter()
        .all(|r| r.starts_with("https://learn.microsoft.com/search/")));

    let calls = completions.calls();
    assert_eq!(calls.len(), 1);
    let (system, instruction) = &calls[0];
    assert_eq!(system, SYSTEM_MESSAGE);
    assert!(instruction.contains("skill: Cloud Concepts"));
    assert!(instruction.contains("utilize ONLY the following services:"));
    for service in ["Compute", "Storage", "Active Directory"] {
        assert!(
            instruction.contains(service),
            "instruction should name the retrieved service {}",
            service
        );
    }

    // Recommendation is read-only against the store
    assert_eq!(store.collection_len(CERT_VECTOR_COLLECTION), 3);
}

#[test_log::test(tokio::test)]
async fn test_recommendation_without_skill_uses_stored_prompt_vector() {
    let (client, _store, _embedder, completions) = start_services();
    client.ingest_certification(az900_payload()).await.unwrap();
    completions.push_response(IDEA_RESPONSE);

    let idea = client
        .recommend_project("AZ-900".to_string(), None, None)
        .await
        .expect("recommendation should succeed")
        .expect("an idea should be produced");
    assert_eq!(idea.title, "Tiered Storage Archive");

    // Without a requested skill the instruction names the skills of the
    // retrieved records instead.
    let calls = completions.calls();
    assert_eq!(calls.len(), 1);
    let instruction = &calls[0].1;
    assert!(instruction.contains("skill: "));
    assert!(instruction.contains("Cloud Concepts"));
    assert!(instruction.contains("Security Basics"));
}

#[test_log::test(tokio::test)]
async fn test_recommendation_for_unknown_certification_returns_none() {
    let (client, _store, _embedder, completions) = start_services();

    let result = client
        .recommend_project("AZ-999".to_string(), None, None)
        .await
        .expect("lookup miss is not an error");

    assert!(result.is_none());
    assert!(completions.calls().is_empty(), "no synthesis without context");
}

#[test_log::test(tokio::test)]
async fn test_recommendation_with_empty_collection_returns_none() {
    let (client, _store, _embedder, completions) = start_services();

    let result = client
        .recommend_project(
            "AZ-900".to_string(),
            Some("Cloud Concepts".to_string()),
            None,
        )
        .await
        .expect("empty retrieval is not an error");

    assert!(result.is_none());
    assert!(completions.calls().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_concept_recommendation_end_to_end() {
    let (client, _store, _embedder, completions) = start_services();
    client.ingest_certification(az900_payload()).await.unwrap();
    completions.push_response(IDEA_RESPONSE);

    let idea = client
        .recommend_project_for_concept("Storage Networking".to_string())
        .await
        .expect("recommendation should succeed")
        .expect("an idea should be produced");

    // The concept doubles as the resource link topic
    assert!(idea
        .resources
        .iter()
        .all(|r| r.contains("Storage%20Networking")));

    let calls = completions.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0]
        .1
        .contains("concept certification: Storage Networking"));
}

#[test_log::test(tokio::test)]
async fn test_malformed_completion_output_is_retryable() {
    let (client, _store, _embedder, completions) = start_services();
    client.ingest_certification(az900_payload()).await.unwrap();
    completions.push_response("I'd suggest building something with Storage!");

    let error = client
        .recommend_project(
            "AZ-900".to_string(),
            Some("Cloud Concepts".to_string()),
            None,
        )
        .await
        .expect_err("prose output must not produce an idea");

    assert!(matches!(error, CoreError::MalformedOutput(_)));
    assert!(error.is_retryable());
}

#[test_log::test(tokio::test)]
async fn test_missing_description_is_schema_violation() {
    let (client, _store, _embedder, completions) = start_services();
    client.ingest_certification(az900_payload()).await.unwrap();
    completions.push_response(r#"{"title": "Half an idea", "steps": []}"#);

    let error = client
        .recommend_project(
            "AZ-900".to_string(),
            Some("Cloud Concepts".to_string()),
            None,
        )
        .await
        .expect_err("schema-violating output must not produce an idea");

    match error {
        CoreError::SchemaViolation { missing } => {
            assert_eq!(missing, vec!["description".to_string()]);
        }
        other => panic!("Expected SchemaViolation, got {:?}", other),
    }
}
