//! Core traits (interfaces) for the certification knowledge base

pub mod document_store;
mod completion_generator;
mod embedding_generator;

pub use completion_generator::CompletionGenerator;
pub use document_store::{DistanceMetric, DocumentStore, ScoredDocument};
pub use embedding_generator::EmbeddingGenerator;
