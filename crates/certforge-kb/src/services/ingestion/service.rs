use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    content::{certification_context_sentence, service_context_sentence},
    data::{
        validate_required_fields, Certification, CertificationIngestOutput, CoreError,
        EmbeddingDocument, InvocationContext, ProjectPromptDocument, ServiceRecord,
        CERTIFICATION_REQUIRED_FIELDS, CERT_VECTOR_COLLECTION, PROJECT_PROMPT_COLLECTION,
        SERVICE_RECORD_REQUIRED_FIELDS,
    },
    services::messages::{IngestionRequest, IngestionResponse, IngestionResultSender},
    traits::{DocumentStore, EmbeddingGenerator},
};

use super::flatten::{flatten_certification, validate_service_record};

/// Service responsible for turning raw certification payloads into stored
/// embedding documents. Processes requests received via channel: schema
/// gate, flatten, build context sentences, embed, and upsert.
pub struct IngestionService {
    document_store: Arc<dyn DocumentStore>,
    embedding_generator: Arc<dyn EmbeddingGenerator>,
    ingestion_rx: mpsc::Receiver<(IngestionRequest, IngestionResultSender)>,
}

impl IngestionService {
    /// Creates a new IngestionService instance with the provided dependencies
    /// and message channel.
    pub fn new(
        document_store: Arc<dyn DocumentStore>,
        embedding_generator: Arc<dyn EmbeddingGenerator>,
        ingestion_rx: mpsc::Receiver<(IngestionRequest, IngestionResultSender)>,
    ) -> Self {
        Self {
            document_store,
            embedding_generator,
            ingestion_rx,
        }
    }

    /// Runs the service, processing requests from the channel.
    /// Each request is processed in a separate task to avoid blocking the
    /// channel; the result travels back through the request's oneshot sender.
    pub async fn run(&mut self) -> Result<(), CoreError> {
        info!("IngestionService started");
        while let Some((request, result_sender)) = self.ingestion_rx.recv().await {
            let document_store = Arc::clone(&self.document_store);
            let embedding_generator = Arc::clone(&self.embedding_generator);

            let _handle = tokio::spawn(async move {
                match request {
                    IngestionRequest::Certification { ctx, payload } => {
                        info!(
                            invocation_id = %ctx.invocation_id,
                            "Processing certification payload"
                        );

                        let response = match process_certification(
                            &document_store,
                            &embedding_generator,
                            &payload,
                            &ctx,
                        )
                        .await
                        {
                            Ok(output) => IngestionResponse::Certification(output),
                            Err(e) => {
                                error!(
                                    invocation_id = %ctx.invocation_id,
                                    error = %e,
                                    "Failed to process certification payload"
                                );
                                IngestionResponse::Error(e)
                            }
                        };

                        if result_sender.sender.send(response).is_err() {
                            warn!(
                                invocation_id = %ctx.invocation_id,
                                "Ingestion result receiver dropped before the response was sent"
                            );
                        }
                    }
                    IngestionRequest::ServiceRecord { ctx, payload } => {
                        info!(
                            invocation_id = %ctx.invocation_id,
                            "Processing service record payload"
                        );

                        let response = match process_service_record(
                            &document_store,
                            &embedding_generator,
                            &payload,
                            &ctx,
                        )
                        .await
                        {
                            Ok(document) => IngestionResponse::ServiceRecord(document),
                            Err(e) => {
                                error!(
                                    invocation_id = %ctx.invocation_id,
                                    error = %e,
                                    "Failed to process service record payload"
                                );
                                IngestionResponse::Error(e)
                            }
                        };

                        if result_sender.sender.send(response).is_err() {
                            warn!(
                                invocation_id = %ctx.invocation_id,
                                "Ingestion result receiver dropped before the response was sent"
                            );
                        }
                    }
                }
            });
        }

        // Channel has been closed
        info!("IngestionService channel closed, shutting down");
        Ok(())
    }

    /// Processes a raw certification payload end to end.
    /// This is a public method that can be called directly without going
    /// through the message channel.
    #[instrument(skip(self, payload), fields(invocation_id = %ctx.invocation_id))]
    pub async fn process_certification(
        &self,
        payload: &str,
        ctx: &InvocationContext,
    ) -> Result<CertificationIngestOutput, CoreError> {
        process_certification(&self.document_store, &self.embedding_generator, payload, ctx).await
    }

    /// Processes a raw standalone service-record payload.
    /// This is a public method that can be called directly without going
    /// through the message channel.
    #[instrument(skip(self, payload), fields(invocation_id = %ctx.invocation_id))]
    pub async fn process_service_record(
        &self,
        payload: &str,
        ctx: &InvocationContext,
    ) -> Result<EmbeddingDocument, CoreError> {
        process_service_record(&self.document_store, &self.embedding_generator, payload, ctx).await
    }
}

/// Standalone function to process a certification payload.
/// Gates the payload against the certification schema, flattens the tree,
/// embeds every record concurrently, then embeds and stores the aggregate
/// prompt document. Any failure aborts the whole payload.
#[instrument(skip(document_store, embedding_generator, payload), fields(invocation_id = %ctx.invocation_id))]
async fn process_certification(
    document_store: &Arc<dyn DocumentStore>,
    embedding_generator: &Arc<dyn EmbeddingGenerator>,
    payload: &str,
    ctx: &InvocationContext,
) -> Result<CertificationIngestOutput, CoreError> {
    if payload.trim().is_empty() {
        return Err(CoreError::EmptyInput);
    }

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| CoreError::validation(format!("payload is not valid JSON: {}", e)))?;
    validate_required_fields(&value, CERTIFICATION_REQUIRED_FIELDS)?;

    let cert: Certification = serde_json::from_value(value).map_err(|e| {
        CoreError::validation(format!("payload does not match the certification shape: {}", e))
    })?;

    let records = flatten_certification(&cert)?;
    info!(
        invocation_id = %ctx.invocation_id,
        certification_code = %cert.certification_code,
        records = records.len(),
        "Flattened certification"
    );

    // Records are independently keyed, so their embed-and-upsert legs can
    // run concurrently. Each leg gets a child context for log correlation.
    let embed_tasks = records.iter().map(|record| {
        let child_ctx = ctx.fan_out();
        async move {
            embed_service_record(document_store, embedding_generator, record, &child_ctx).await
        }
    });
    let documents = futures::future::join_all(embed_tasks)
        .await
        .into_iter()
        .collect::<Result<Vec<EmbeddingDocument>, CoreError>>()?;

    let sentence = certification_context_sentence(&cert);
    let vector = embedding_generator.generate_embedding(&sentence).await?;
    let prompt_document = ProjectPromptDocument {
        id: Uuid::new_v4(),
        certification_code: cert.certification_code.clone(),
        certification_name: cert.certification_name.clone(),
        sentence,
        vector,
    };

    document_store
        .upsert(
            PROJECT_PROMPT_COLLECTION,
            &prompt_document.certification_code,
            serde_json::to_value(&prompt_document)?,
        )
        .await?;

    info!(
        invocation_id = %ctx.invocation_id,
        certification_code = %cert.certification_code,
        documents = documents.len(),
        "Successfully ingested certification"
    );

    Ok(CertificationIngestOutput {
        service_records: records,
        prompt_document,
        archived_payload: payload.to_string(),
    })
}

/// Standalone function to process a standalone service-record payload.
#[instrument(skip(document_store, embedding_generator, payload), fields(invocation_id = %ctx.invocation_id))]
async fn process_service_record(
    document_store: &Arc<dyn DocumentStore>,
    embedding_generator: &Arc<dyn EmbeddingGenerator>,
    payload: &str,
    ctx: &InvocationContext,
) -> Result<EmbeddingDocument, CoreError> {
    if payload.trim().is_empty() {
        return Err(CoreError::EmptyInput);
    }

    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| CoreError::validation(format!("payload is not valid JSON: {}", e)))?;
    validate_required_fields(&value, SERVICE_RECORD_REQUIRED_FIELDS)?;

    let record: ServiceRecord = serde_json::from_value(value).map_err(|e| {
        CoreError::validation(format!("payload does not match the service record shape: {}", e))
    })?;

    embed_service_record(document_store, embedding_generator, &record, ctx).await
}

/// Embeds one service record and upserts the resulting document under its
/// composite key. Re-running with the same record overwrites in place.
async fn embed_service_record(
    document_store: &Arc<dyn DocumentStore>,
    embedding_generator: &Arc<dyn EmbeddingGenerator>,
    record: &ServiceRecord,
    ctx: &InvocationContext,
) -> Result<EmbeddingDocument, CoreError> {
    validate_service_record(record)?;

    let sentence = service_context_sentence(record);
    let vector = embedding_generator.generate_embedding(&sentence).await?;
    let document = EmbeddingDocument::from_record(record, sentence, vector);

    document_store
        .upsert(
            CERT_VECTOR_COLLECTION,
            &document.composite_key,
            serde_json::to_value(&document)?,
        )
        .await?;

    info!(
        invocation_id = %ctx.invocation_id,
        composite_key = %document.composite_key,
        "Stored embedding document"
    );

    Ok(document)
}
