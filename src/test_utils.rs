//! Test Utilities Module
//!
//! Scripted collaborators for deterministic tests: an RPC backend that
//! records every submission, wallets in each connection state, and an
//! in-memory metadata store. Nothing here touches the network.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use solana_sdk::{
    account::Account,
    hash::Hash,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::{Transaction, VersionedTransaction},
};
use spl_token::{
    solana_program::program_option::COption,
    state::{Account as TokenAccount, AccountState, Mint},
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::ipfs::{DeployData, MetadataStorage, OffchainMetadata};
use crate::rpc_manager::{RpcBackend, RpcManagerError, RpcResult};
use crate::wallet::{sign_versioned_with, WalletAdapter, WalletError};

/// Rent returned for every data length
pub const MOCK_RENT_LAMPORTS: u64 = 1_461_600;

/// A raw submission seen by [`MockRpc`]
#[derive(Debug, Clone)]
pub struct Submission {
    pub bytes: Vec<u8>,
    pub at: Instant,
}

/// Scripted RPC backend
///
/// Failures are consumed in order: `fail_submissions(1)` fails the next
/// submission only. Transactions touching a poisoned key fail on every
/// attempt.
pub struct MockRpc {
    blockhash: Hash,
    accounts: Mutex<HashMap<Pubkey, Account>>,
    token_accounts: Mutex<Vec<(Pubkey, Account)>>,
    submissions: Mutex<Vec<Submission>>,
    poisoned_keys: Mutex<HashSet<Pubkey>>,
    blockhash_failures: AtomicU32,
    account_failures: AtomicU32,
    submit_failures: AtomicU32,
    calls: AtomicUsize,
}

impl MockRpc {
    pub fn new() -> Self {
        Self {
            blockhash: Hash::new_unique(),
            accounts: Mutex::new(HashMap::new()),
            token_accounts: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
            poisoned_keys: Mutex::new(HashSet::new()),
            blockhash_failures: AtomicU32::new(0),
            account_failures: AtomicU32::new(0),
            submit_failures: AtomicU32::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub async fn set_account(&self, pubkey: Pubkey, account: Account) {
        self.accounts.lock().await.insert(pubkey, account);
    }

    /// Register a token account returned by the owner scan
    pub async fn add_token_account(&self, pubkey: Pubkey, account: Account) {
        self.token_accounts.lock().await.push((pubkey, account.clone()));
        self.set_account(pubkey, account).await;
    }

    pub fn fail_blockhash(&self, times: u32) {
        self.blockhash_failures.store(times, Ordering::SeqCst);
    }

    pub fn fail_account_fetches(&self, times: u32) {
        self.account_failures.store(times, Ordering::SeqCst);
    }

    pub fn fail_submissions(&self, times: u32) {
        self.submit_failures.store(times, Ordering::SeqCst);
    }

    /// Every transaction referencing `key` fails to confirm
    pub async fn poison_key(&self, key: Pubkey) {
        self.poisoned_keys.lock().await.insert(key);
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    /// Raw bytes of every submission, retries included
    pub async fn submitted(&self) -> Vec<Vec<u8>> {
        self.submissions
            .lock()
            .await
            .iter()
            .map(|s| s.bytes.clone())
            .collect()
    }

    pub async fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().await.clone()
    }

    /// Number of backend calls of any kind
    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn transport_error(&self, what: &str) -> RpcManagerError {
        RpcManagerError::Transport {
            endpoint: self.endpoint().to_string(),
            message: format!("scripted {} failure", what),
        }
    }
}

impl Default for MockRpc {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcBackend for MockRpc {
    fn endpoint(&self) -> &str {
        "mock://rpc"
    }

    async fn get_latest_blockhash(&self) -> RpcResult<Hash> {
        self.record_call();
        if Self::take_failure(&self.blockhash_failures) {
            return Err(self.transport_error("blockhash"));
        }
        Ok(self.blockhash)
    }

    async fn get_account(&self, pubkey: &Pubkey) -> RpcResult<Option<Account>> {
        self.record_call();
        if Self::take_failure(&self.account_failures) {
            return Err(self.transport_error("account"));
        }
        Ok(self.accounts.lock().await.get(pubkey).cloned())
    }

    async fn get_multiple_accounts(&self, pubkeys: &[Pubkey]) -> RpcResult<Vec<Option<Account>>> {
        self.record_call();
        if Self::take_failure(&self.account_failures) {
            return Err(self.transport_error("account"));
        }
        let accounts = self.accounts.lock().await;
        Ok(pubkeys.iter().map(|key| accounts.get(key).cloned()).collect())
    }

    async fn get_minimum_balance_for_rent_exemption(&self, _data_len: usize) -> RpcResult<u64> {
        self.record_call();
        Ok(MOCK_RENT_LAMPORTS)
    }

    async fn get_token_accounts_by_owner(&self, owner: &Pubkey) -> RpcResult<Vec<(Pubkey, Account)>> {
        self.record_call();
        if Self::take_failure(&self.account_failures) {
            return Err(self.transport_error("account"));
        }
        let owned = self
            .token_accounts
            .lock()
            .await
            .iter()
            .filter(|(_, account)| {
                TokenAccount::unpack(&account.data)
                    .map(|state| state.owner == *owner)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        Ok(owned)
    }

    async fn send_and_confirm_raw_transaction(&self, raw_tx: &[u8]) -> RpcResult<Signature> {
        self.record_call();
        self.submissions.lock().await.push(Submission {
            bytes: raw_tx.to_vec(),
            at: Instant::now(),
        });

        let tx: VersionedTransaction = bincode::deserialize(raw_tx)
            .map_err(|e| RpcManagerError::MalformedTransaction(e.to_string()))?;
        let poisoned = {
            let keys = self.poisoned_keys.lock().await;
            tx.message.static_account_keys().iter().any(|k| keys.contains(k))
        };
        if poisoned || Self::take_failure(&self.submit_failures) {
            return Err(self.transport_error("submission"));
        }
        if !tx.verify_with_results().iter().all(|ok| *ok) {
            return Err(RpcManagerError::RpcResponse {
                endpoint: self.endpoint().to_string(),
                message: "Transaction signature verification failure".to_string(),
                code: Some(-32003),
            });
        }
        Ok(tx.signatures[0])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalletMode {
    Connected,
    Disconnected,
    Rejecting,
}

/// Wallet in a chosen connection state
pub struct MockWallet {
    keypair: Keypair,
    mode: WalletMode,
    sign_requests: AtomicUsize,
}

impl MockWallet {
    fn with_mode(mode: WalletMode) -> Self {
        Self {
            keypair: Keypair::new(),
            mode,
            sign_requests: AtomicUsize::new(0),
        }
    }

    /// Signs every request
    pub fn connected() -> Self {
        Self::with_mode(WalletMode::Connected)
    }

    /// Exposes no key
    pub fn disconnected() -> Self {
        Self::with_mode(WalletMode::Disconnected)
    }

    /// Exposes a key but the user declines every request
    pub fn rejecting() -> Self {
        Self::with_mode(WalletMode::Rejecting)
    }

    /// Number of signing requests, batch requests count once
    pub fn sign_requests(&self) -> usize {
        self.sign_requests.load(Ordering::SeqCst)
    }

    fn check_mode(&self) -> Result<(), WalletError> {
        self.sign_requests.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            WalletMode::Connected => Ok(()),
            WalletMode::Disconnected => Err(WalletError::NotConnected),
            WalletMode::Rejecting => Err(WalletError::Rejected("User rejected the request".to_string())),
        }
    }
}

#[async_trait]
impl WalletAdapter for MockWallet {
    fn pubkey(&self) -> Option<Pubkey> {
        match self.mode {
            WalletMode::Disconnected => None,
            _ => Some(self.keypair.pubkey()),
        }
    }

    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        self.check_mode()?;
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(tx)
    }

    async fn sign_all_transactions(
        &self,
        txs: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, WalletError> {
        self.check_mode()?;
        txs.into_iter()
            .map(|tx| sign_versioned_with(&self.keypair, tx))
            .collect()
    }
}

/// In-memory metadata store
pub struct MockMetadataStorage {
    hash: Option<String>,
    deployed: Mutex<Vec<DeployData>>,
    documents: Mutex<HashMap<String, OffchainMetadata>>,
}

impl MockMetadataStorage {
    /// Every deploy returns `hash`
    pub fn new(hash: &str) -> Self {
        Self {
            hash: Some(hash.to_string()),
            deployed: Mutex::new(Vec::new()),
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Every deploy fails
    pub fn failing() -> Self {
        Self {
            hash: None,
            deployed: Mutex::new(Vec::new()),
            documents: Mutex::new(HashMap::new()),
        }
    }

    pub async fn insert_document(&self, uri: &str, document: OffchainMetadata) {
        self.documents.lock().await.insert(uri.to_string(), document);
    }

    pub async fn deployed(&self) -> Vec<DeployData> {
        self.deployed.lock().await.clone()
    }
}

#[async_trait]
impl MetadataStorage for MockMetadataStorage {
    async fn deploy(&self, data: DeployData) -> Option<String> {
        self.deployed.lock().await.push(data);
        self.hash.clone()
    }

    async fn fetch_metadata(&self, uri: &str) -> Option<OffchainMetadata> {
        self.documents.lock().await.get(uri).cloned()
    }
}

fn to_coption(key: Option<Pubkey>) -> COption<Pubkey> {
    match key {
        Some(key) => COption::Some(key),
        None => COption::None,
    }
}

/// An initialized mint account owned by the SPL Token program
pub fn mint_account(
    mint_authority: Option<Pubkey>,
    freeze_authority: Option<Pubkey>,
    decimals: u8,
    supply: u64,
) -> Account {
    let state = Mint {
        mint_authority: to_coption(mint_authority),
        supply,
        decimals,
        is_initialized: true,
        freeze_authority: to_coption(freeze_authority),
    };
    let mut data = vec![0u8; Mint::LEN];
    Mint::pack(state, &mut data).unwrap();
    Account {
        lamports: MOCK_RENT_LAMPORTS,
        data,
        owner: spl_token::id(),
        executable: false,
        rent_epoch: 0,
    }
}

/// An initialized token account holding `amount` raw units
pub fn token_account(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Account {
    let state = TokenAccount {
        mint: *mint,
        owner: *owner,
        amount,
        delegate: COption::None,
        state: AccountState::Initialized,
        is_native: COption::None,
        delegated_amount: 0,
        close_authority: COption::None,
    };
    let mut data = vec![0u8; TokenAccount::LEN];
    TokenAccount::pack(state, &mut data).unwrap();
    Account {
        lamports: 2_039_280,
        data,
        owner: spl_token::id(),
        executable: false,
        rent_epoch: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::system_instruction;

    #[tokio::test]
    async fn test_mock_rpc_consumes_scripted_failures() {
        let rpc = MockRpc::new();
        rpc.fail_blockhash(1);

        assert!(rpc.get_latest_blockhash().await.is_err());
        assert_eq!(rpc.get_latest_blockhash().await.unwrap(), rpc.blockhash());
        assert_eq!(rpc.total_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_rpc_returns_fee_payer_signature() {
        let rpc = MockRpc::new();
        let payer = Keypair::new();
        let ix = system_instruction::transfer(&payer.pubkey(), &Pubkey::new_unique(), 1);
        let tx = Transaction::new_signed_with_payer(&[ix], Some(&payer.pubkey()), &[&payer], rpc.blockhash());
        let raw = bincode::serialize(&VersionedTransaction::from(tx.clone())).unwrap();

        assert_eq!(rpc.send_and_confirm_raw_transaction(&raw).await.unwrap(), tx.signatures[0]);
        assert_eq!(rpc.submitted().await, vec![raw]);
    }

    #[tokio::test]
    async fn test_mock_wallet_modes() {
        assert!(MockWallet::connected().pubkey().is_some());
        assert!(MockWallet::disconnected().pubkey().is_none());

        let rejecting = MockWallet::rejecting();
        assert!(rejecting.pubkey().is_some());
        assert!(matches!(
            rejecting.sign_all_transactions(vec![]).await,
            Err(WalletError::Rejected(_))
        ));
        assert_eq!(rejecting.sign_requests(), 1);
    }

    #[test]
    fn test_token_fixtures_unpack() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let account = token_account(&mint, &owner, 42);
        assert_eq!(TokenAccount::unpack(&account.data).unwrap().amount, 42);

        let mint_acc = mint_account(Some(owner), None, 9, 1_000);
        let state = Mint::unpack(&mint_acc.data).unwrap();
        assert_eq!(state.supply, 1_000);
        assert_eq!(state.freeze_authority, COption::None);
    }
}
