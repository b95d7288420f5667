//! Ingestion pipeline: schema gate, flatten, embed, persist

pub mod flatten;
pub mod service;

pub use flatten::{flatten_certification, validate_service_record};
pub use service::IngestionService;
