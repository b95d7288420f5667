//! Invocation context for unit-of-work tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one unit of work triggered by an external event. Under
/// at-least-once delivery the same input may arrive under different
/// invocation ids; all pipeline steps are idempotent with respect to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvocationContext {
    pub invocation_id: Uuid,
    pub triggered_by: Option<Uuid>,
    pub started_at: DateTime<Utc>,
}

impl InvocationContext {
    /// Creates a fresh root context for an externally triggered invocation.
    pub fn new_root() -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            triggered_by: None,
            started_at: Utc::now(),
        }
    }

    /// Creates a child context for work fanned out of this invocation,
    /// recording the parent invocation id.
    pub fn fan_out(&self) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            triggered_by: Some(self.invocation_id),
            started_at: Utc::now(),
        }
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new_root()
    }
}
