//! Error types for the certification knowledge base

use thiserror::Error;

/// Base Error type for core pipeline operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Schema violation: missing required fields: {}", .missing.join(", "))]
    SchemaViolation { missing: Vec<String> },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Input is empty or whitespace")]
    EmptyInput,

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Malformed generative output: {0}")]
    MalformedOutput(String),

    #[error("Not found: collection={collection} key={key}")]
    NotFound { collection: String, key: String },

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization/Deserialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal system error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Helper to create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    /// Helper to create a schema violation naming the missing fields
    pub fn schema_violation(missing: Vec<String>) -> Self {
        CoreError::SchemaViolation { missing }
    }

    /// Helper to create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        CoreError::Provider(message.into())
    }

    /// Helper to create a not found error
    pub fn not_found(collection: impl Into<String>, key: impl Into<String>) -> Self {
        CoreError::NotFound {
            collection: collection.into(),
            key: key.into(),
        }
    }

    /// Whether the triggering layer may retry the failed invocation.
    ///
    /// Provider transport faults and malformed generative output are transient
    /// (the latter because the model is nondeterministic); validation, schema
    /// and guard failures will fail identically on replay.
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::Provider(_) | CoreError::MalformedOutput(_) => true,
            CoreError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Specific error type for the Document Store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document store connection error: {0}")]
    Connection(String),
    #[error("Document store query error: {0}")]
    Query(String),
    #[error("Data mapping error from store result: {0}")]
    Mapping(String),
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl StoreError {
    /// Connection and query faults are transient; mapping and dimension
    /// faults reproduce on replay.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Connection(_) | StoreError::Query(_))
    }
}
