//! Wallet management module
//!
//! The token engine never touches key material directly: it asks a
//! [`WalletAdapter`] for the fee payer key and for signatures. A wallet may
//! be disconnected, in which case it exposes no public key.

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, VersionedTransaction},
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::rpc_manager::{RpcBackend, SolanaRpc};

/// Errors raised by a wallet while signing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,

    /// The user (or the signing device) declined the request
    #[error("Signing rejected: {0}")]
    Rejected(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Signing capability of a connected wallet
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Public key of the connected account, `None` when disconnected
    fn pubkey(&self) -> Option<Pubkey>;

    /// Add the wallet signature to a fully assembled transaction
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError>;

    /// Sign a batch of transactions in one request
    async fn sign_all_transactions(
        &self,
        txs: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, WalletError>;
}

/// Wallet backed by a local keypair
pub struct KeypairWallet {
    keypair: Arc<Keypair>,
}

impl KeypairWallet {
    /// Create a new wallet from a keypair file (JSON array or raw 64 bytes)
    pub fn from_file(path: &str) -> Result<Self> {
        let keypair_bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read keypair file: {}", path))?;

        let keypair = if keypair_bytes.len() == 64 {
            if keypair_bytes.iter().all(|&b| b == 0) {
                anyhow::bail!("Invalid keypair: all-zero key rejected");
            }
            Keypair::try_from(keypair_bytes.as_slice()).context("Invalid keypair bytes")?
        } else {
            let json: Vec<u8> = serde_json::from_slice(&keypair_bytes)
                .context("Failed to parse keypair JSON")?;
            if json.len() != 64 {
                anyhow::bail!("Invalid keypair length: expected 64 bytes, got {}", json.len());
            }
            if json.iter().all(|&b| b == 0) {
                anyhow::bail!("Invalid keypair: all-zero key rejected");
            }
            Keypair::try_from(json.as_slice()).context("Invalid keypair from JSON")?
        };

        Ok(Self::from_keypair(keypair))
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl Clone for KeypairWallet {
    fn clone(&self) -> Self {
        Self {
            keypair: Arc::clone(&self.keypair),
        }
    }
}

/// Sign the wallet's slot of a versioned transaction.
///
/// The signature vector is padded to the number of required signatures so
/// that partially built transactions can be handed in unsigned.
pub fn sign_versioned_with(
    keypair: &Keypair,
    mut tx: VersionedTransaction,
) -> Result<VersionedTransaction, WalletError> {
    let required = tx.message.header().num_required_signatures as usize;
    let signer = keypair.pubkey();
    let position = tx
        .message
        .static_account_keys()
        .iter()
        .take(required)
        .position(|key| *key == signer)
        .ok_or_else(|| WalletError::Signing(format!("{} is not a required signer", signer)))?;

    if tx.signatures.len() < required {
        tx.signatures.resize(required, Default::default());
    }
    let message_bytes = tx.message.serialize();
    tx.signatures[position] = keypair
        .try_sign_message(&message_bytes)
        .map_err(|e| WalletError::Signing(e.to_string()))?;
    Ok(tx)
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn pubkey(&self) -> Option<Pubkey> {
        Some(self.keypair.pubkey())
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[self.keypair.as_ref()], blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(tx)
    }

    async fn sign_all_transactions(
        &self,
        txs: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, WalletError> {
        txs.into_iter()
            .map(|tx| sign_versioned_with(&self.keypair, tx))
            .collect()
    }
}

/// Placeholder for a wallet that is not connected
#[derive(Debug, Clone, Copy, Default)]
pub struct DisconnectedWallet;

#[async_trait]
impl WalletAdapter for DisconnectedWallet {
    fn pubkey(&self) -> Option<Pubkey> {
        None
    }

    async fn sign_transaction(&self, _tx: Transaction) -> Result<Transaction, WalletError> {
        Err(WalletError::NotConnected)
    }

    async fn sign_all_transactions(
        &self,
        _txs: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, WalletError> {
        Err(WalletError::NotConnected)
    }
}

/// A wallet bound to the RPC connection it submits through
#[derive(Clone)]
pub struct Provider {
    rpc: Arc<dyn RpcBackend>,
    wallet: Arc<dyn WalletAdapter>,
}

impl Provider {
    pub fn new(rpc: Arc<dyn RpcBackend>, wallet: Arc<dyn WalletAdapter>) -> Self {
        Self { rpc, wallet }
    }

    pub fn rpc(&self) -> &Arc<dyn RpcBackend> {
        &self.rpc
    }

    pub fn wallet(&self) -> &Arc<dyn WalletAdapter> {
        &self.wallet
    }

    pub fn pubkey(&self) -> Option<Pubkey> {
        self.wallet.pubkey()
    }
}

/// What the caller hands in: an already wired provider, or a bare wallet
/// plus the endpoint to connect it to
pub enum ProviderSource {
    Provider(Provider),
    Wallet {
        wallet: Arc<dyn WalletAdapter>,
        rpc_endpoint: String,
    },
}

impl ProviderSource {
    pub fn provider(provider: Provider) -> Self {
        Self::Provider(provider)
    }

    pub fn wallet(wallet: Arc<dyn WalletAdapter>, rpc_endpoint: impl Into<String>) -> Self {
        Self::Wallet {
            wallet,
            rpc_endpoint: rpc_endpoint.into(),
        }
    }

    /// Resolve into a provider, connecting a bare wallet to its endpoint
    pub fn into_provider(self, timeout: Duration) -> Provider {
        match self {
            Self::Provider(provider) => provider,
            Self::Wallet {
                wallet,
                rpc_endpoint,
            } => Provider::new(Arc::new(SolanaRpc::new(rpc_endpoint, timeout)), wallet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{
        hash::Hash,
        message::{v0, VersionedMessage},
        system_instruction,
    };
    use std::io::Write;

    #[test]
    fn test_from_file_json_format() {
        let keypair = Keypair::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let wallet = KeypairWallet::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(wallet.pubkey(), Some(keypair.pubkey()));
    }

    #[test]
    fn test_from_file_rejects_zero_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 64]).unwrap();

        let err = KeypairWallet::from_file(file.path().to_str().unwrap())
            .err()
            .unwrap();
        assert!(err.to_string().contains("all-zero"));
    }

    #[tokio::test]
    async fn test_sign_transaction_fills_payer_slot() {
        let wallet = KeypairWallet::from_keypair(Keypair::new());
        let payer = wallet.pubkey().unwrap();
        let ix = system_instruction::transfer(&payer, &Pubkey::new_unique(), 1);
        let mut tx = Transaction::new_with_payer(&[ix], Some(&payer));
        tx.message.recent_blockhash = Hash::new_unique();

        let signed = wallet.sign_transaction(tx).await.unwrap();
        assert!(signed.is_signed());
        assert!(signed.verify().is_ok());
    }

    #[tokio::test]
    async fn test_sign_all_rejects_foreign_transaction() {
        let wallet = KeypairWallet::from_keypair(Keypair::new());
        let other = Pubkey::new_unique();
        let ix = system_instruction::transfer(&other, &Pubkey::new_unique(), 1);
        let msg = v0::Message::try_compile(&other, &[ix], &[], Hash::new_unique()).unwrap();
        let tx = VersionedTransaction {
            signatures: vec![],
            message: VersionedMessage::V0(msg),
        };

        let err = wallet.sign_all_transactions(vec![tx]).await.unwrap_err();
        assert!(matches!(err, WalletError::Signing(_)));
    }

    #[tokio::test]
    async fn test_disconnected_wallet() {
        let wallet = DisconnectedWallet;
        assert!(wallet.pubkey().is_none());
        assert_eq!(
            wallet.sign_all_transactions(vec![]).await.unwrap_err(),
            WalletError::NotConnected
        );
    }
}
