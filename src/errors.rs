//! Error taxonomy returned by every token operation
//!
//! Every fallible public operation returns [`Web3Result`]. Internal layers
//! (RPC, wallet, transaction building) carry richer errors and are mapped
//! onto this flat enumeration at the component boundary. The UI/CLI layer
//! is responsible for turning a code into a user-facing message.

use thiserror::Error;

/// Flat error code set for token operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Web3Error {
    #[error("WALLET_NOT_FOUND")]
    WalletNotFound,

    #[error("TRANSACTION_FAILED")]
    TransactionFailed,

    #[error("INVALID_PUBKEY_STR")]
    InvalidPubkeyStr,

    #[error("FAILED_TO_FETCH_DATA")]
    FailedToFetchData,

    #[error("FAILED_TO_DEPLOY_METADATA")]
    FailedToDeployMetadata,

    #[error("FAILED_TO_PREPARE_TX")]
    FailedToPrepareTx,

    #[error("TX_SIGN_FAILED")]
    TxSignFailed,

    // Token state
    #[error("TOKEN_NOT_FOUND")]
    TokenNotFound,

    #[error("AUTHORITY_ALREADY_REVOKED")]
    AuthorityAlreadyRevoked,

    #[error("NOT_ENOUGH_TOKEN")]
    NotEnoughToken,

    #[error("UNAUTHORISED")]
    Unauthorised,
}

/// Result alias used by all token operations
pub type Web3Result<T> = std::result::Result<T, Web3Error>;

impl Web3Error {
    /// Stable code string for the error
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WalletNotFound => "WALLET_NOT_FOUND",
            Self::TransactionFailed => "TRANSACTION_FAILED",
            Self::InvalidPubkeyStr => "INVALID_PUBKEY_STR",
            Self::FailedToFetchData => "FAILED_TO_FETCH_DATA",
            Self::FailedToDeployMetadata => "FAILED_TO_DEPLOY_METADATA",
            Self::FailedToPrepareTx => "FAILED_TO_PREPARE_TX",
            Self::TxSignFailed => "TX_SIGN_FAILED",
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::AuthorityAlreadyRevoked => "AUTHORITY_ALREADY_REVOKED",
            Self::NotEnoughToken => "NOT_ENOUGH_TOKEN",
            Self::Unauthorised => "UNAUTHORISED",
        }
    }
}
