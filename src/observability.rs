//! Observability module for correlation of operation logs

use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use crate::structured_logging::StructuredLogger;

/// Correlation ID for tracking one token operation across components
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Create a new correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Context of a single engine operation (create, revoke, airdrop, list)
#[derive(Debug, Clone)]
pub struct OperationContext {
    /// Operation name
    pub operation: &'static str,

    pub correlation_id: CorrelationId,

    pub started_at: Instant,

    /// Structured logger bound to the correlation id
    pub logger: StructuredLogger,
}

impl OperationContext {
    pub fn new(operation: &'static str) -> Self {
        let correlation_id = CorrelationId::new();
        Self {
            operation,
            logger: StructuredLogger::new(correlation_id.clone()),
            correlation_id,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}
