//! Transaction submission
//!
//! [`TxSender`] owns the sign-and-submit pipeline: fetch a blockhash, let
//! ephemeral signers sign, ask the wallet for its signature, then submit the
//! serialized bytes with one retry. The retry resends the exact same bytes.

use futures::future::join_all;
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    signature::{Keypair, Signature},
    transaction::VersionedTransaction,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;
use tracing::{debug, instrument};

use crate::metrics::metrics;
use crate::observability::CorrelationId;
use crate::rpc_manager::{retry_with_fixed_delay, RetryPolicy};
use crate::structured_logging::StructuredLogger;
use crate::tx_builder::builder::{assemble_transaction, serialize_transaction, TxRequest};
use crate::tx_builder::errors::TransactionBuilderError;
use crate::wallet::Provider;

/// Per-call options of [`TxSender::send_transaction`]
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Log failures; `None` falls back to the sender default
    pub log_error_msg: Option<bool>,

    /// Correlation id of the calling operation
    pub correlation_id: Option<CorrelationId>,
}

impl SendOptions {
    pub fn with_correlation_id(correlation_id: CorrelationId) -> Self {
        Self {
            log_error_msg: None,
            correlation_id: Some(correlation_id),
        }
    }
}

/// Signs and submits transactions through a [`Provider`]
#[derive(Clone)]
pub struct TxSender {
    provider: Provider,
    retry_policy: RetryPolicy,
    log_errors: bool,
}

impl TxSender {
    pub fn new(provider: Provider, retry_policy: RetryPolicy, log_errors: bool) -> Self {
        Self {
            provider,
            retry_policy,
            log_errors,
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn log_errors(&self) -> bool {
        self.log_errors
    }

    /// Build, sign and submit one transaction.
    ///
    /// Fails with `WalletNotConnected` before any network access when the
    /// wallet exposes no key. A blockhash failure is not retried; the
    /// submission is retried once with identical bytes.
    #[instrument(skip_all, fields(instructions = instructions.len(), signers = ephemeral_signers.len() + 1))]
    pub async fn send_transaction(
        &self,
        instructions: Vec<Instruction>,
        ephemeral_signers: Vec<Keypair>,
        options: SendOptions,
    ) -> Result<Signature, TransactionBuilderError> {
        let log_errors = options.log_error_msg.unwrap_or(self.log_errors);
        let logger = StructuredLogger::new(options.correlation_id.unwrap_or_default());
        let started = Instant::now();

        let result = self
            .sign_and_submit(instructions, ephemeral_signers, &logger)
            .await;

        if let Err(err) = &result {
            if log_errors {
                logger.log_tx_failure(
                    err.category(),
                    &err.to_string(),
                    started.elapsed().as_millis() as u64,
                );
            }
        }
        result
    }

    async fn sign_and_submit(
        &self,
        instructions: Vec<Instruction>,
        ephemeral_signers: Vec<Keypair>,
        logger: &StructuredLogger,
    ) -> Result<Signature, TransactionBuilderError> {
        let payer = self
            .provider
            .pubkey()
            .ok_or(TransactionBuilderError::WalletNotConnected)?;
        let request = TxRequest::new(instructions, ephemeral_signers, payer)?;

        let blockhash = self
            .provider
            .rpc()
            .get_latest_blockhash()
            .await
            .map_err(TransactionBuilderError::Blockhash)?;

        let tx = assemble_transaction(&request, blockhash)?;
        let signed = self.provider.wallet().sign_transaction(tx).await?;
        let raw = serialize_transaction(&VersionedTransaction::from(signed))?;

        logger.log_tx_attempt(request.instructions.len(), request.signer_count());
        self.submit_raw(&raw, logger).await
    }

    /// Submit serialized bytes, retrying once per the policy
    pub async fn submit_raw(
        &self,
        raw_tx: &[u8],
        logger: &StructuredLogger,
    ) -> Result<Signature, TransactionBuilderError> {
        let started = Instant::now();
        let rpc = self.provider.rpc().as_ref();
        let m = metrics();
        let attempt_counter = AtomicU32::new(0);
        let attempts = &attempt_counter;

        let result = retry_with_fixed_delay("send_transaction", &self.retry_policy, move || async move {
            if attempts.fetch_add(1, Ordering::SeqCst) > 0 {
                m.tx_retries_total.inc();
            }
            m.tx_submissions_total.inc();
            rpc.send_and_confirm_raw_transaction(raw_tx).await
        })
        .await;

        match result {
            Ok(signature) => {
                m.tx_confirmed_total.inc();
                m.tx_confirm_latency.observe(started.elapsed().as_secs_f64());
                logger.log_tx_success(&signature.to_string(), started.elapsed().as_millis() as u64);
                Ok(signature)
            }
            Err(err) => {
                m.tx_failures_total.inc();
                debug!(endpoint = rpc.endpoint(), error = %err, "Submission gave up");
                Err(TransactionBuilderError::Submission(err))
            }
        }
    }

    /// Latest blockhash, fetched under the retry policy
    pub async fn latest_blockhash_with_retry(&self) -> Result<Hash, TransactionBuilderError> {
        let rpc = self.provider.rpc().as_ref();
        retry_with_fixed_delay("get_latest_blockhash", &self.retry_policy, move || {
            rpc.get_latest_blockhash()
        })
        .await
        .map_err(TransactionBuilderError::Blockhash)
    }

    /// Have the wallet sign a whole batch in one request
    pub async fn sign_batch(
        &self,
        txs: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, TransactionBuilderError> {
        if self.provider.pubkey().is_none() {
            return Err(TransactionBuilderError::WalletNotConnected);
        }
        Ok(self.provider.wallet().sign_all_transactions(txs).await?)
    }

    /// Submit signed transactions concurrently. Results keep the input
    /// order; one failure does not affect the others.
    pub async fn submit_all(
        &self,
        txs: &[VersionedTransaction],
        logger: &StructuredLogger,
        log_errors: bool,
    ) -> Vec<Result<Signature, TransactionBuilderError>> {
        let submissions = txs.iter().enumerate().map(|(index, tx)| async move {
            let raw = serialize_transaction(tx)?;
            let result = self.submit_raw(&raw, logger).await;
            if let Err(err) = &result {
                if log_errors {
                    logger.warn(&format!("Batch transaction {} failed: {}", index, err));
                }
            }
            result
        });
        join_all(submissions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockRpc, MockWallet};
    use crate::wallet::WalletAdapter;
    use solana_sdk::{pubkey::Pubkey, signature::Signer, system_instruction};
    use std::sync::Arc;

    fn sender(rpc: Arc<MockRpc>, wallet: MockWallet) -> TxSender {
        TxSender::new(
            Provider::new(rpc, Arc::new(wallet)),
            RetryPolicy::default(),
            false,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnected_wallet_fails_before_network() {
        let rpc = Arc::new(MockRpc::new());
        let sender = sender(rpc.clone(), MockWallet::disconnected());
        let ix = system_instruction::transfer(&Pubkey::new_unique(), &Pubkey::new_unique(), 1);

        let err = sender
            .send_transaction(vec![ix], vec![], SendOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TransactionBuilderError::WalletNotConnected));
        assert_eq!(rpc.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blockhash_failure_is_not_submitted() {
        let rpc = Arc::new(MockRpc::new());
        rpc.fail_blockhash(1);
        let wallet = MockWallet::connected();
        let payer = wallet.pubkey().unwrap();
        let sender = sender(rpc.clone(), wallet);
        let ix = system_instruction::transfer(&payer, &Pubkey::new_unique(), 1);

        let err = sender
            .send_transaction(vec![ix], vec![], SendOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TransactionBuilderError::Blockhash(_)));
        assert!(rpc.submitted().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_signature_is_not_submitted() {
        let rpc = Arc::new(MockRpc::new());
        let wallet = MockWallet::rejecting();
        let payer = wallet.pubkey().unwrap();
        let sender = sender(rpc.clone(), wallet);
        let ix = system_instruction::transfer(&payer, &Pubkey::new_unique(), 1);

        let err = sender
            .send_transaction(vec![ix], vec![], SendOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TransactionBuilderError::Signing(_)));
        assert!(rpc.submitted().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_returns_fee_payer_signature() {
        let rpc = Arc::new(MockRpc::new());
        let wallet = MockWallet::connected();
        let payer = wallet.pubkey().unwrap();
        let sender = sender(rpc.clone(), wallet);
        let mint = Keypair::new();
        let ix = system_instruction::create_account(&payer, &mint.pubkey(), 1, 82, &spl_token::id());

        let sig = sender
            .send_transaction(vec![ix], vec![mint], SendOptions::default())
            .await
            .unwrap();

        let submitted = rpc.submitted().await;
        assert_eq!(submitted.len(), 1);
        let tx: VersionedTransaction = bincode::deserialize(&submitted[0]).unwrap();
        assert_eq!(tx.signatures[0], sig);
        assert!(tx.verify_with_results().iter().all(|ok| *ok));
    }
}
