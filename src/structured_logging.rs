//! Structured logging for token operations

use crate::observability::CorrelationId;

/// Structured logger for transaction lifecycle events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    context_id: CorrelationId,
}

impl StructuredLogger {
    pub fn new(context_id: CorrelationId) -> Self {
        Self { context_id }
    }

    pub fn context_id(&self) -> &CorrelationId {
        &self.context_id
    }

    pub fn log_operation_start(&self, operation: &str) {
        tracing::info!(
            context_id = %self.context_id,
            operation = %operation,
            "Operation started"
        );
    }

    pub fn log_tx_attempt(&self, instruction_count: usize, signer_count: usize) {
        tracing::debug!(
            context_id = %self.context_id,
            instruction_count = %instruction_count,
            signer_count = %signer_count,
            "Submitting transaction"
        );
    }

    pub fn log_tx_success(&self, sig: &str, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            signature = %sig,
            latency_ms = %latency_ms,
            "Transaction confirmed"
        );
    }

    pub fn log_tx_failure(&self, category: &str, error: &str, latency_ms: u64) {
        tracing::warn!(
            context_id = %self.context_id,
            category = %category,
            error = %error,
            latency_ms = %latency_ms,
            "Transaction failed"
        );
    }

    pub fn log_batch_outcome(&self, chunks: usize, confirmed: usize, failed_receivers: usize) {
        tracing::info!(
            context_id = %self.context_id,
            chunks = %chunks,
            confirmed = %confirmed,
            failed_receivers = %failed_receivers,
            "Batch submission finished"
        );
    }

    pub fn log_rejection(&self, operation: &str, code: &str, elapsed_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            operation = %operation,
            code = %code,
            elapsed_ms = %elapsed_ms,
            "Operation rejected"
        );
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            message = %message,
            "Warning"
        );
    }
}
