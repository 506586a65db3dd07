use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_request::RpcError;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single call against the node
#[derive(Debug, Clone, Error)]
pub enum RpcManagerError {
    /// The request never got an answer (connection, DNS, HTTP layer)
    #[error("Node unreachable at {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The node answered with an error
    #[error("Node at {endpoint} rejected the request: {message} (code: {code:?})")]
    RpcResponse {
        endpoint: String,
        message: String,
        code: Option<i64>,
    },

    /// Bytes handed to the submit call do not decode as a transaction
    #[error("Malformed transaction bytes: {0}")]
    MalformedTransaction(String),
}

impl RpcManagerError {
    /// Sort a client error into transport vs node-side rejection
    pub fn from_client_error(err: ClientError, endpoint: &str) -> Self {
        let endpoint = endpoint.to_string();
        match err.kind() {
            ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => RpcManagerError::Transport {
                endpoint,
                message: err.to_string(),
            },
            ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) => {
                RpcManagerError::RpcResponse {
                    endpoint,
                    message: message.clone(),
                    code: Some(*code),
                }
            }
            _ => RpcManagerError::RpcResponse {
                endpoint,
                message: err.to_string(),
                code: None,
            },
        }
    }
}

/// Retry policy for submissions and account fetches.
///
/// Every failure is retried the same way, whatever its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,

    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::retry_once_after(Duration::from_millis(2_000))
    }
}

impl RetryPolicy {
    pub fn retry_once_after(delay: Duration) -> Self {
        Self {
            max_attempts: 2,
            delay,
        }
    }

    /// Delay before the given retry (1-indexed), `None` once exhausted
    pub fn delay_for_retry(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry >= self.max_attempts.max(1) {
            return None;
        }
        Some(self.delay)
    }
}
