//! Token Engine
//!
//! Entry point for token operations: creation with metadata, authority
//! revocation, batch airdrops and listing the wallet's fungible tokens.
//!
//! Every operation:
//! - fails with `WALLET_NOT_FOUND` before any network call when the wallet
//!   exposes no key
//! - runs under its own [`OperationContext`], so all log lines of one call
//!   share a correlation id
//! - returns a flat [`Web3Error`] code; richer causes are logged, not
//!   returned

use futures::future::join_all;
use mpl_token_metadata::{accounts::Metadata, types::TokenStandard};
use solana_sdk::{
    account::Account,
    instruction::Instruction,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use spl_associated_token_account::get_associated_token_address;
use spl_token::state::Mint;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::errors::{Web3Error, Web3Result};
use crate::ipfs::{gateway_uri, DeployData, MetadataStorage};
use crate::metrics::metrics;
use crate::observability::OperationContext;
use crate::preflight::{self, authority_of};
use crate::rpc_manager::{retry_with_fixed_delay, RetryPolicy, RpcBackend, RpcManagerError};
use crate::tx_builder::{
    assemble_versioned_transaction, plan_airdrop_chunk, plan_create_token_instructions,
    revoke_authority_instruction, AirdropTransfer, AuthorityKind, CreateTokenParams, SendOptions,
    TransactionBuilderError, TxSender,
};
use crate::types::{
    AirdropInput, AirdropOutcome, CreateTokenInput, CreateTokenOutcome, RevokeTokenAuthorityInput,
    TxPassResult, UserToken,
};
use crate::utils::{calc_decimal_value, calc_non_decimal_value, pubkey_from_str};
use crate::wallet::ProviderSource;

/// Hash used in the metadata uri when JSON deployment is skipped
const SKIPPED_METADATA_HASH: &str = "null";

/// Token operations over one provider
pub struct TokenEngine {
    sender: TxSender,
    storage: Arc<dyn MetadataStorage>,
    config: Config,
}

impl TokenEngine {
    pub fn new(source: ProviderSource, storage: Arc<dyn MetadataStorage>, config: Config) -> Self {
        let provider = source.into_provider(Duration::from_secs(config.network.timeout_secs));
        let retry_policy = RetryPolicy::retry_once_after(config.retry_delay());
        let sender = TxSender::new(provider, retry_policy, config.log_errors());
        Self {
            sender,
            storage,
            config,
        }
    }

    pub fn sender(&self) -> &TxSender {
        &self.sender
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn rpc(&self) -> &dyn RpcBackend {
        self.sender.provider().rpc().as_ref()
    }

    fn user(&self) -> Web3Result<Pubkey> {
        self.sender.provider().pubkey().ok_or(Web3Error::WalletNotFound)
    }

    /// Log the rejection code of a failed operation
    fn finish<T>(&self, ctx: &OperationContext, result: Web3Result<T>) -> Web3Result<T> {
        if let Err(code) = &result {
            ctx.logger.log_rejection(ctx.operation, code.as_str(), ctx.elapsed_ms());
            if matches!(
                code,
                Web3Error::TokenNotFound
                    | Web3Error::AuthorityAlreadyRevoked
                    | Web3Error::NotEnoughToken
                    | Web3Error::Unauthorised
            ) {
                metrics().preflight_rejections_total.inc();
            }
        }
        result
    }

    fn fetch_failed(&self, ctx: &OperationContext, err: RpcManagerError) -> Web3Error {
        if self.sender.log_errors() {
            ctx.logger.warn(&format!("Account fetch failed: {}", err));
        }
        Web3Error::FailedToFetchData
    }

    async fn fetch_accounts(
        &self,
        ctx: &OperationContext,
        keys: &[Pubkey],
    ) -> Web3Result<Vec<Option<Account>>> {
        let rpc = self.rpc();
        retry_with_fixed_delay("get_multiple_accounts", self.sender.retry_policy(), move || {
            rpc.get_multiple_accounts(keys)
        })
        .await
        .map_err(|e| self.fetch_failed(ctx, e))
    }

    async fn fetch_account(&self, ctx: &OperationContext, key: &Pubkey) -> Web3Result<Option<Account>> {
        let rpc = self.rpc();
        retry_with_fixed_delay("get_account", self.sender.retry_policy(), move || rpc.get_account(key))
            .await
            .map_err(|e| self.fetch_failed(ctx, e))
    }

    /// Sign and submit `instructions`, see [`TxSender::send_transaction`]
    pub async fn send_transaction(
        &self,
        instructions: Vec<Instruction>,
        ephemeral_signers: Vec<Keypair>,
        options: SendOptions,
    ) -> Web3Result<Signature> {
        self.sender
            .send_transaction(instructions, ephemeral_signers, options)
            .await
            .map_err(Web3Error::from)
    }

    /// Create a fungible token with Metaplex metadata and mint the initial
    /// supply to the creator
    pub async fn create_token(&self, input: CreateTokenInput) -> Web3Result<CreateTokenOutcome> {
        let ctx = OperationContext::new("create_token");
        let result = self.create_token_inner(&ctx, input).await;
        self.finish(&ctx, result)
    }

    async fn create_token_inner(
        &self,
        ctx: &OperationContext,
        input: CreateTokenInput,
    ) -> Web3Result<CreateTokenOutcome> {
        let user = self.user()?;
        ctx.logger.log_operation_start(ctx.operation);

        let hash = if self.config.metadata.skip_deploy_json_metadata {
            SKIPPED_METADATA_HASH.to_string()
        } else {
            let document = serde_json::json!({
                "image": input.image,
                "description": input.description,
                "external_url": input.social_links.website,
                "extensions": input.social_links,
            });
            self.storage
                .deploy(DeployData::Json(document))
                .await
                .ok_or(Web3Error::FailedToDeployMetadata)?
        };
        let uri = gateway_uri(self.config.metadata.gateway_domain(), &hash);

        let initial_supply =
            calc_non_decimal_value(input.supply, input.decimals).ok_or(Web3Error::FailedToPrepareTx)?;
        let rent = self
            .rpc()
            .get_minimum_balance_for_rent_exemption(Mint::LEN)
            .await
            .map_err(|e| Web3Error::from(TransactionBuilderError::AccountData(e)))?;

        let mint_keypair = Keypair::new();
        let mint = mint_keypair.pubkey();
        let params = CreateTokenParams {
            name: input.name,
            symbol: input.symbol,
            uri,
            decimals: input.decimals,
            initial_supply,
            is_mutable: !input.immutable,
            revoke_mint: input.revoke_mint,
            revoke_freeze: input.revoke_freeze,
        };
        let instructions = plan_create_token_instructions(&params, &user, &mint, rent)?;

        let signature = self
            .send_transaction(
                instructions,
                vec![mint_keypair],
                SendOptions::with_correlation_id(ctx.correlation_id.clone()),
            )
            .await?;

        Ok(CreateTokenOutcome {
            token_address: mint.to_string(),
            tx_signature: signature.to_string(),
        })
    }

    /// Set the requested mint authorities to none
    pub async fn revoke_authority(&self, input: RevokeTokenAuthorityInput) -> Web3Result<TxPassResult> {
        let ctx = OperationContext::new("revoke_authority");
        let result = self.revoke_authority_inner(&ctx, input).await;
        self.finish(&ctx, result)
    }

    async fn revoke_authority_inner(
        &self,
        ctx: &OperationContext,
        input: RevokeTokenAuthorityInput,
    ) -> Web3Result<TxPassResult> {
        let user = self.user()?;
        let mint = pubkey_from_str(&input.mint)?;
        ctx.logger.log_operation_start(ctx.operation);

        let account = self.fetch_account(ctx, &mint).await?;
        let mint_state = preflight::decode_mint(account.as_ref())?;
        let kinds = preflight::plan_revocations(&mint_state, &user, input.minting, input.freezing)?;

        let instructions = kinds
            .into_iter()
            .map(|kind| revoke_authority_instruction(&mint, &user, kind))
            .collect::<Result<Vec<_>, _>>()?;

        let signature = self
            .send_transaction(
                instructions,
                vec![],
                SendOptions::with_correlation_id(ctx.correlation_id.clone()),
            )
            .await?;

        Ok(TxPassResult {
            tx_signature: signature.to_string(),
        })
    }

    /// Transfer tokens to many receivers in chunked transactions.
    ///
    /// Chunks are signed in one wallet request and submitted concurrently;
    /// a failed chunk only moves its own receivers to the failed list.
    pub async fn airdrop(&self, input: AirdropInput) -> Web3Result<AirdropOutcome> {
        let ctx = OperationContext::new("airdrop");
        let result = self.airdrop_inner(&ctx, input).await;
        self.finish(&ctx, result)
    }

    async fn airdrop_inner(&self, ctx: &OperationContext, input: AirdropInput) -> Web3Result<AirdropOutcome> {
        let user = self.user()?;
        let mint = pubkey_from_str(&input.mint)?;
        let receivers = input
            .receivers
            .iter()
            .map(|r| pubkey_from_str(&r.wallet))
            .collect::<Web3Result<Vec<_>>>()?;
        if receivers.is_empty() {
            return Ok(AirdropOutcome::default());
        }
        ctx.logger.log_operation_start(ctx.operation);

        let user_ata = get_associated_token_address(&user, &mint);
        let accounts = self.fetch_accounts(ctx, &[user_ata, mint]).await?;
        let mint_state = preflight::decode_mint(accounts.get(1).and_then(Option::as_ref))?;

        let amounts = input
            .receivers
            .iter()
            .map(|r| calc_non_decimal_value(r.amount, mint_state.decimals))
            .collect::<Option<Vec<u64>>>()
            .ok_or(Web3Error::FailedToPrepareTx)?;
        let total = amounts
            .iter()
            .try_fold(0u64, |acc, amount| acc.checked_add(*amount))
            .ok_or(Web3Error::NotEnoughToken)?;
        preflight::check_sender_balance(accounts.first().and_then(Option::as_ref), total)?;

        let receiver_atas: Vec<Pubkey> = receivers
            .iter()
            .map(|receiver| get_associated_token_address(receiver, &mint))
            .collect();
        let ata_accounts = self.fetch_accounts(ctx, &receiver_atas).await?;

        let transfers: Vec<AirdropTransfer> = receivers
            .iter()
            .zip(&receiver_atas)
            .zip(&amounts)
            .enumerate()
            .map(|(i, ((receiver, ata), amount))| AirdropTransfer {
                receiver: *receiver,
                receiver_ata: *ata,
                amount: *amount,
                init_ata: ata_accounts.get(i).map_or(true, Option::is_none),
            })
            .collect();

        let blockhash = self.sender.latest_blockhash_with_retry().await.map_err(|e| {
            if self.sender.log_errors() {
                ctx.logger.warn(&e.to_string());
            }
            Web3Error::from(e)
        })?;

        let chunk_size = self.config.transaction.airdrop_chunk_size.max(1);
        let unsigned = transfers
            .chunks(chunk_size)
            .map(|chunk| {
                let instructions = plan_airdrop_chunk(&user, &user_ata, &mint, chunk)?;
                assemble_versioned_transaction(&user, &instructions, blockhash)
            })
            .collect::<Result<Vec<_>, TransactionBuilderError>>()?;
        let chunk_count = unsigned.len();

        let signed = self.sender.sign_batch(unsigned).await.map_err(|e| {
            if self.sender.log_errors() {
                ctx.logger.warn(&e.to_string());
            }
            Web3Error::from(e)
        })?;
        if signed.len() != chunk_count {
            return Err(Web3Error::TxSignFailed);
        }

        let results = self
            .sender
            .submit_all(&signed, &ctx.logger, self.sender.log_errors())
            .await;

        let mut outcome = AirdropOutcome::default();
        for (chunk, result) in input.receivers.chunks(chunk_size).zip(results) {
            match result {
                Ok(signature) => {
                    outcome.tx_signatures.push(signature.to_string());
                    outcome.pass_tx_receivers.extend_from_slice(chunk);
                }
                Err(_) => outcome.fail_tx_receivers.extend_from_slice(chunk),
            }
        }

        ctx.logger.log_batch_outcome(
            chunk_count,
            outcome.tx_signatures.len(),
            outcome.fail_tx_receivers.len(),
        );
        Ok(outcome)
    }

    /// Fungible tokens held by the wallet, with off-chain image and
    /// description when reachable
    pub async fn get_all_tokens(&self) -> Web3Result<Vec<UserToken>> {
        let ctx = OperationContext::new("get_all_tokens");
        let result = self.get_all_tokens_inner(&ctx).await;
        self.finish(&ctx, result)
    }

    async fn get_all_tokens_inner(&self, ctx: &OperationContext) -> Web3Result<Vec<UserToken>> {
        let user = self.user()?;
        ctx.logger.log_operation_start(ctx.operation);

        let rpc = self.rpc();
        let owner = &user;
        let owned = retry_with_fixed_delay(
            "get_token_accounts_by_owner",
            self.sender.retry_policy(),
            move || rpc.get_token_accounts_by_owner(owner),
        )
        .await
        .map_err(|e| self.fetch_failed(ctx, e))?;

        let holdings: Vec<(Pubkey, u64)> = owned
            .iter()
            .filter_map(|(_, account)| preflight::decode_token_account(Some(account)))
            .map(|state| (state.mint, state.amount))
            .collect();
        if holdings.is_empty() {
            return Ok(Vec::new());
        }

        let mut keys: Vec<Pubkey> = holdings.iter().map(|(mint, _)| *mint).collect();
        keys.extend(holdings.iter().map(|(mint, _)| Metadata::find_pda(mint).0));
        let accounts = self.fetch_accounts(ctx, &keys).await?;
        let (mint_accounts, metadata_accounts) = accounts.split_at(holdings.len().min(accounts.len()));

        let mut tokens = Vec::with_capacity(holdings.len());
        let mut uris = Vec::with_capacity(holdings.len());
        for (i, (mint, balance)) in holdings.iter().enumerate() {
            let Ok(mint_state) = preflight::decode_mint(mint_accounts.get(i).and_then(Option::as_ref)) else {
                continue;
            };
            let Some(metadata) = metadata_accounts
                .get(i)
                .and_then(Option::as_ref)
                .and_then(|account| Metadata::from_bytes(&account.data).ok())
            else {
                continue;
            };
            if !is_fungible(metadata.token_standard.as_ref()) {
                continue;
            }

            let minting_authority = authority_of(&mint_state, AuthorityKind::Minting);
            let freezing_authority = authority_of(&mint_state, AuthorityKind::Freezing);
            uris.push(trim_padding(&metadata.uri).to_string());
            tokens.push(UserToken {
                mint: mint.to_string(),
                name: trim_padding(&metadata.name).to_string(),
                symbol: trim_padding(&metadata.symbol).to_string(),
                image: String::new(),
                description: String::new(),
                decimals: mint_state.decimals,
                supply: calc_decimal_value(mint_state.supply, mint_state.decimals),
                balance: calc_decimal_value(*balance, mint_state.decimals),
                is_minting_auth_revoked: minting_authority.is_none(),
                minting_authority: minting_authority.map(|k| k.to_string()),
                is_freezing_auth_revoked: freezing_authority.is_none(),
                freezing_authority: freezing_authority.map(|k| k.to_string()),
            });
        }

        let documents = join_all(uris.iter().map(|uri| self.storage.fetch_metadata(uri))).await;
        for (token, document) in tokens.iter_mut().zip(documents) {
            if let Some(document) = document {
                token.image = document.image.unwrap_or_default();
                token.description = document.description.unwrap_or_default();
            }
        }

        Ok(tokens)
    }
}

/// Strip the NUL padding of fixed-size metadata strings
pub fn trim_padding(value: &str) -> &str {
    value.split('\0').next().unwrap_or_default()
}

pub fn is_fungible(standard: Option<&TokenStandard>) -> bool {
    matches!(standard, Some(TokenStandard::Fungible))
}
