//! Error types for transaction building and submission
//!
//! Errors carry the underlying cause for logging. They collapse onto the
//! flat [`Web3Error`] codes at the engine boundary via `From`.

use thiserror::Error;

use crate::errors::Web3Error;
use crate::rpc_manager::RpcManagerError;
use crate::wallet::WalletError;

/// Error type for all transaction builder operations
#[derive(Error, Debug)]
pub enum TransactionBuilderError {
    /// No public key exposed by the wallet
    #[error("Wallet not connected")]
    WalletNotConnected,

    /// A transaction needs at least one instruction
    #[error("Instruction list is empty")]
    EmptyInstructions,

    /// Failed to build an instruction for a specific program
    #[error("Instruction build error (program={program}): {reason}")]
    InstructionBuild {
        /// The program the instruction targets
        program: String,
        /// Detailed reason for the failure
        reason: String,
    },

    /// Failed to fetch the recent blockhash
    #[error("Blockhash error: {0}")]
    Blockhash(#[source] RpcManagerError),

    /// Failed to read state needed to build instructions (rent, accounts)
    #[error("Account data error: {0}")]
    AccountData(#[source] RpcManagerError),

    /// An ephemeral signer could not sign the transaction
    #[error("Ephemeral signing failed: {0}")]
    EphemeralSigning(String),

    /// The wallet rejected or failed the signing request
    #[error("Wallet signing failed: {0}")]
    Signing(#[from] WalletError),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Submission failed, retry included
    #[error("Submission failed: {0}")]
    Submission(#[source] RpcManagerError),
}

impl TransactionBuilderError {
    /// Get the error category for metrics and observability
    pub fn category(&self) -> &'static str {
        match self {
            Self::WalletNotConnected => "wallet",
            Self::EmptyInstructions => "validation",
            Self::InstructionBuild { .. } => "instruction",
            Self::Blockhash(_) => "blockhash",
            Self::AccountData(_) => "rpc",
            Self::EphemeralSigning(_) => "signing",
            Self::Signing(_) => "signing",
            Self::Serialization(_) => "serialization",
            Self::Submission(_) => "submission",
        }
    }

    /// Create an instruction build error for a specific program
    pub fn instruction_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InstructionBuild {
            program: program.into(),
            reason: reason.into(),
        }
    }
}

impl From<TransactionBuilderError> for Web3Error {
    fn from(err: TransactionBuilderError) -> Self {
        match err {
            TransactionBuilderError::WalletNotConnected => Web3Error::WalletNotFound,
            TransactionBuilderError::Blockhash(_) => Web3Error::FailedToFetchData,
            TransactionBuilderError::Signing(WalletError::NotConnected) => Web3Error::WalletNotFound,
            TransactionBuilderError::Signing(_) => Web3Error::TxSignFailed,
            TransactionBuilderError::Submission(_) => Web3Error::TransactionFailed,
            TransactionBuilderError::EmptyInstructions
            | TransactionBuilderError::InstructionBuild { .. }
            | TransactionBuilderError::AccountData(_)
            | TransactionBuilderError::EphemeralSigning(_)
            | TransactionBuilderError::Serialization(_) => Web3Error::FailedToPrepareTx,
        }
    }
}
