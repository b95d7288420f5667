//! Adapters for external storage services

pub mod neo4j;

// Re-export adapters for easier import
#[cfg(feature = "neo4rs")]
pub use neo4j::{Neo4jConfig, Neo4jDocumentStore};
