//! Recommendation pipeline: retrieve, compose, synthesize, validate

pub mod service;

pub use service::{RecommendationService, DEFAULT_TOP_K};
