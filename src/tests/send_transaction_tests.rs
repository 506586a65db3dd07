#[cfg(test)]
mod tests {
    use crate::errors::Web3Error;
    use crate::test_utils::MockWallet;
    use crate::tests::test_helpers::Harness;
    use crate::tx_builder::SendOptions;
    use solana_sdk::{
        instruction::Instruction, pubkey::Pubkey, signature::Keypair, signer::Signer,
        system_instruction,
    };
    use std::time::Duration;

    fn transfer(harness: &Harness) -> Vec<Instruction> {
        vec![system_instruction::transfer(&harness.user(), &Pubkey::new_unique(), 1_000)]
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_submits_once() {
        let h = Harness::new(MockWallet::connected());

        let sig = h
            .engine
            .send_transaction(transfer(&h), vec![], SendOptions::default())
            .await
            .unwrap();

        let txs = h.submitted_txs().await;
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].signatures[0], sig);
        assert_eq!(txs[0].message.recent_blockhash(), &h.rpc.blockhash());
        assert_eq!(txs[0].message.static_account_keys()[0], h.user());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_resends_identical_bytes_after_delay() {
        let h = Harness::new(MockWallet::connected());
        h.rpc.fail_submissions(1);

        let sig = h
            .engine
            .send_transaction(transfer(&h), vec![], SendOptions::default())
            .await
            .unwrap();

        let submissions = h.rpc.submissions().await;
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].bytes, submissions[1].bytes);
        assert!(submissions[1].at - submissions[0].at >= Duration::from_millis(2_000));
        // signed once, never re-signed for the retry
        assert_eq!(h.wallet.sign_requests(), 1);
        assert_eq!(h.submitted_txs().await[1].signatures[0], sig);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_failure_is_transaction_failed_without_third_attempt() {
        let h = Harness::new(MockWallet::connected());
        h.rpc.fail_submissions(5);

        let err = h
            .engine
            .send_transaction(transfer(&h), vec![], SendOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err, Web3Error::TransactionFailed);
        assert_eq!(h.rpc.submitted().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_option_does_not_change_outcome() {
        let h = Harness::new(MockWallet::connected());
        h.rpc.fail_submissions(2);

        let options = SendOptions {
            log_error_msg: Some(true),
            correlation_id: None,
        };
        let err = h
            .engine
            .send_transaction(transfer(&h), vec![], options)
            .await
            .unwrap_err();

        assert_eq!(err, Web3Error::TransactionFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wallet_rejection_is_tx_sign_failed() {
        let h = Harness::new(MockWallet::rejecting());

        let err = h
            .engine
            .send_transaction(transfer(&h), vec![], SendOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err, Web3Error::TxSignFailed);
        assert!(h.rpc.submitted().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_instructions_fail_before_network() {
        let h = Harness::new(MockWallet::connected());

        let err = h
            .engine
            .send_transaction(vec![], vec![], SendOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err, Web3Error::FailedToPrepareTx);
        assert_eq!(h.rpc.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blockhash_failure_is_failed_to_fetch_data() {
        let h = Harness::new(MockWallet::connected());
        h.rpc.fail_blockhash(1);

        let err = h
            .engine
            .send_transaction(transfer(&h), vec![], SendOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err, Web3Error::FailedToFetchData);
        assert_eq!(h.wallet.sign_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ephemeral_signer_is_included() {
        let h = Harness::new(MockWallet::connected());
        let account = Keypair::new();
        let ix = system_instruction::create_account(
            &h.user(),
            &account.pubkey(),
            1_000,
            0,
            &solana_sdk::system_program::id(),
        );

        h.engine
            .send_transaction(vec![ix], vec![account.insecure_clone()], SendOptions::default())
            .await
            .unwrap();

        let txs = h.submitted_txs().await;
        let tx = &txs[0];
        assert_eq!(tx.signatures.len(), 2);
        assert_eq!(tx.message.static_account_keys()[1], account.pubkey());
        assert!(tx.verify_with_results().iter().all(|ok| *ok));
    }
}
