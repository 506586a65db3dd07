//! Token Launcher - SPL token creation, authority revocation and airdrops
//!
//! This library exposes the token engine and its collaborators; the
//! `token-launcher` binary is a thin CLI over it.

pub mod config;
pub mod errors;
pub mod explorer;
pub mod ipfs;
pub mod metrics;
pub mod observability;
pub mod preflight;
pub mod structured_logging;
pub mod test_utils;
pub mod token_engine;
pub mod tx_builder;
pub mod types;
pub mod utils;
pub mod wallet;

// Component modules with non-standard paths (directories with spaces)
#[path = "rpc manager/mod.rs"]
pub mod rpc_manager;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::Config;
pub use errors::{Web3Error, Web3Result};
pub use token_engine::TokenEngine;
pub use wallet::{KeypairWallet, Provider, ProviderSource, WalletAdapter};
pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
