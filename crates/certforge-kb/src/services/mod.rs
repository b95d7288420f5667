//! Channel-driven services composing the certification knowledge base

pub mod client;
pub mod ingestion;
pub mod messages;
pub mod recommendation;

pub use client::KbClient;
pub use ingestion::IngestionService;
pub use recommendation::{RecommendationService, DEFAULT_TOP_K};
