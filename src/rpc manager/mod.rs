//! RPC Manager Module
//!
//! The [`RpcBackend`] trait is the only way the engine reaches the network.
//! [`SolanaRpc`] implements it over the non-blocking `RpcClient`; tests swap
//! in a scripted backend.

use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, RpcFilterType},
};
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use std::time::Duration;
use tracing::{debug, instrument};

// Submodules
pub mod rpc_errors;
pub mod rpc_retry;

// Re-exports for convenience
pub use rpc_errors::{RetryPolicy, RpcManagerError};
pub use rpc_retry::retry_with_fixed_delay;

pub type RpcResult<T> = Result<T, RpcManagerError>;

/// Upper bound of keys per `getMultipleAccounts` request
pub const MAX_MULTIPLE_ACCOUNTS: usize = 100;

/// Offset of the owner field inside an SPL token account
const TOKEN_ACCOUNT_OWNER_OFFSET: usize = 32;

/// Remote node operations used by the token engine
#[async_trait]
pub trait RpcBackend: Send + Sync {
    /// URL of the node, for logging and error context
    fn endpoint(&self) -> &str;

    async fn get_latest_blockhash(&self) -> RpcResult<Hash>;

    async fn get_account(&self, pubkey: &Pubkey) -> RpcResult<Option<Account>>;

    /// Accounts in the same order as `pubkeys`, `None` for missing ones
    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> RpcResult<Vec<Option<Account>>>;

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> RpcResult<u64>;

    /// SPL token accounts owned by `owner`
    async fn get_token_accounts_by_owner(&self, owner: &Pubkey) -> RpcResult<Vec<(Pubkey, Account)>>;

    /// Submit a serialized, fully signed transaction and wait for confirmation
    async fn send_and_confirm_raw_transaction(&self, raw_tx: &[u8]) -> RpcResult<Signature>;
}

/// [`RpcBackend`] over a Solana JSON-RPC node
pub struct SolanaRpc {
    client: RpcClient,
    url: String,
}

impl std::fmt::Debug for SolanaRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaRpc").field("url", &self.url).finish()
    }
}

impl SolanaRpc {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let url = url.into();
        let client = RpcClient::new_with_timeout_and_commitment(
            url.clone(),
            timeout,
            CommitmentConfig::confirmed(),
        );
        Self { client, url }
    }

    fn map_err(&self, err: solana_client::client_error::ClientError) -> RpcManagerError {
        RpcManagerError::from_client_error(err, &self.url)
    }
}

#[async_trait]
impl RpcBackend for SolanaRpc {
    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn get_latest_blockhash(&self) -> RpcResult<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn get_account(&self, pubkey: &Pubkey) -> RpcResult<Option<Account>> {
        let response = self
            .client
            .get_account_with_commitment(pubkey, self.client.commitment())
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(response.value)
    }

    #[instrument(skip(self, pubkeys), fields(count = pubkeys.len()))]
    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> RpcResult<Vec<Option<Account>>> {
        let mut accounts = Vec::with_capacity(pubkeys.len());
        for batch in pubkeys.chunks(MAX_MULTIPLE_ACCOUNTS) {
            let response = self
                .client
                .get_multiple_accounts_with_commitment(batch, self.client.commitment())
                .await
                .map_err(|e| self.map_err(e))?;
            accounts.extend(response.value);
        }
        debug!(requested = pubkeys.len(), returned = accounts.len(), "Batched account fetch");
        Ok(accounts)
    }

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize) -> RpcResult<u64> {
        self.client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn get_token_accounts_by_owner(&self, owner: &Pubkey) -> RpcResult<Vec<(Pubkey, Account)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![
                RpcFilterType::DataSize(spl_token::state::Account::LEN as u64),
                RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
                    TOKEN_ACCOUNT_OWNER_OFFSET,
                    owner.as_ref(),
                )),
            ]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(self.client.commitment()),
                ..Default::default()
            },
            ..Default::default()
        };
        self.client
            .get_program_accounts_with_config(&spl_token::id(), config)
            .await
            .map_err(|e| self.map_err(e))
    }

    async fn send_and_confirm_raw_transaction(&self, raw_tx: &[u8]) -> RpcResult<Signature> {
        let tx: VersionedTransaction = bincode::deserialize(raw_tx)
            .map_err(|e| RpcManagerError::MalformedTransaction(e.to_string()))?;
        self.client
            .send_and_confirm_transaction(&tx)
            .await
            .map_err(|e| self.map_err(e))
    }
}
