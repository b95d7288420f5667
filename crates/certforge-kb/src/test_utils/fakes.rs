use std::collections::{HashMap, VecDeque};
use std::fmt;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::data::CoreError;
use crate::traits::{CompletionGenerator, EmbeddingGenerator};

/// Fake implementation of EmbeddingGenerator for testing.
///
/// Texts registered via `add_embedding` return their precomputed vector;
/// everything else falls back to a deterministic 4-dimensional vector
/// derived from the text bytes, so repeated calls always agree.
pub struct FakeEmbeddingService {
    data: Mutex<HashMap<String, Vec<f32>>>,
}

impl FakeEmbeddingService {
    /// Creates a new instance of FakeEmbeddingService
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a precomputed embedding for a specific text
    pub fn add_embedding(&self, text: &str, embedding: Vec<f32>) {
        let mut store = self.data.lock();
        store.insert(text.to_string(), embedding);
    }
}

impl Default for FakeEmbeddingService {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FakeEmbeddingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeEmbeddingService").finish()
    }
}

#[async_trait]
impl EmbeddingGenerator for FakeEmbeddingService {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::EmptyInput);
        }

        let store = self.data.lock();
        if let Some(embedding) = store.get(text) {
            Ok(embedding.clone())
        } else {
            // Deterministic embedding based on the hash of the text, so the
            // same sentence always lands at the same point.
            let hash = text.bytes().fold(0u32, |acc, b| acc.wrapping_add(b as u32));

            Ok(vec![
                (hash % 100) as f32 / 100.0,
                ((hash >> 8) % 100) as f32 / 100.0,
                ((hash >> 16) % 100) as f32 / 100.0,
                ((hash >> 24) % 100) as f32 / 100.0,
            ])
        }
    }
}

/// Fake implementation of CompletionGenerator for testing.
///
/// Responses queued via `push_response` are returned in order; once the
/// queue runs dry a fixed valid project-idea JSON is returned. Every call's
/// (system, user) message pair is recorded for assertion.
pub struct FakeCompletionService {
    canned: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeCompletionService {
    /// Creates a new instance of FakeCompletionService
    pub fn new() -> Self {
        Self {
            canned: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues a raw response to be returned by the next `complete` call
    pub fn push_response(&self, raw: impl Into<String>) {
        let mut canned = self.canned.lock();
        canned.push_back(raw.into());
    }

    /// Returns the recorded (system message, user message) pairs
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

impl Default for FakeCompletionService {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FakeCompletionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeCompletionService").finish()
    }
}

#[async_trait]
impl CompletionGenerator for FakeCompletionService {
    async fn complete(&self, system_message: &str, user_message: &str) -> Result<String, CoreError> {
        let mut calls = self.calls.lock();
        calls.push((system_message.to_string(), user_message.to_string()));
        drop(calls);

        let mut canned = self.canned.lock();
        if let Some(raw) = canned.pop_front() {
            Ok(raw)
        } else {
            Ok(r#"{"title": "Default Project", "description": "A default project idea.", "steps": []}"#
                .to_string())
        }
    }
}
