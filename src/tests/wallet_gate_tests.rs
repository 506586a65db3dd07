#[cfg(test)]
mod tests {
    use crate::errors::Web3Error;
    use crate::test_utils::MockWallet;
    use crate::tests::test_helpers::Harness;
    use crate::tx_builder::SendOptions;
    use crate::types::{AirdropInput, AirdropReceiver, CreateTokenInput, RevokeTokenAuthorityInput};
    use solana_sdk::{pubkey::Pubkey, system_instruction};

    #[tokio::test(start_paused = true)]
    async fn test_every_operation_requires_a_wallet() {
        let h = Harness::new(MockWallet::disconnected());
        let mint = Pubkey::new_unique().to_string();

        let create = h
            .engine
            .create_token(CreateTokenInput {
                name: "Sol".to_string(),
                symbol: "SOL".to_string(),
                image: String::new(),
                decimals: 9,
                description: String::new(),
                supply: 1000.0,
                immutable: false,
                revoke_mint: false,
                revoke_freeze: false,
                social_links: Default::default(),
            })
            .await;
        let revoke = h
            .engine
            .revoke_authority(RevokeTokenAuthorityInput {
                mint: mint.clone(),
                minting: true,
                freezing: false,
            })
            .await;
        let airdrop = h
            .engine
            .airdrop(AirdropInput {
                mint,
                receivers: vec![AirdropReceiver {
                    wallet: Pubkey::new_unique().to_string(),
                    amount: 1.0,
                }],
            })
            .await;
        let listing = h.engine.get_all_tokens().await;
        let ix = system_instruction::transfer(&Pubkey::new_unique(), &Pubkey::new_unique(), 1);
        let send = h
            .engine
            .send_transaction(vec![ix], vec![], SendOptions::default())
            .await;

        assert_eq!(create.unwrap_err(), Web3Error::WalletNotFound);
        assert_eq!(revoke.unwrap_err(), Web3Error::WalletNotFound);
        assert_eq!(airdrop.unwrap_err(), Web3Error::WalletNotFound);
        assert_eq!(listing.unwrap_err(), Web3Error::WalletNotFound);
        assert_eq!(send.unwrap_err(), Web3Error::WalletNotFound);

        assert_eq!(h.rpc.total_calls(), 0);
        assert!(h.storage.deployed().await.is_empty());
        assert_eq!(h.wallet.sign_requests(), 0);
    }
}
