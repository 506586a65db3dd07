//! Instruction planning for token operations
//!
//! Pure functions: every plan is returned to the caller, nothing is
//! accumulated on a long-lived object. Order inside a plan is the order the
//! runtime executes.

use crate::tx_builder::errors::TransactionBuilderError;
use mpl_token_metadata::{
    accounts::Metadata,
    instructions::CreateMetadataAccountV3Builder,
    types::{Creator, DataV2},
};
use solana_sdk::{
    instruction::Instruction,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
};
use spl_associated_token_account::{
    get_associated_token_address,
    instruction::{create_associated_token_account, create_associated_token_account_idempotent},
};
use spl_token::{instruction::AuthorityType, state::Mint};

/// Which mint authority an instruction targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityKind {
    Minting,
    Freezing,
}

impl AuthorityKind {
    fn as_spl(self) -> AuthorityType {
        match self {
            AuthorityKind::Minting => AuthorityType::MintTokens,
            AuthorityKind::Freezing => AuthorityType::FreezeAccount,
        }
    }
}

/// Parameters of a new fungible token
#[derive(Debug, Clone)]
pub struct CreateTokenParams {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub decimals: u8,
    /// Initial supply in raw (smallest) units, minted to the creator's ATA
    pub initial_supply: u64,
    pub is_mutable: bool,
    pub revoke_mint: bool,
    pub revoke_freeze: bool,
}

/// Set an authority of `mint` to none
pub fn revoke_authority_instruction(
    mint: &Pubkey,
    current_authority: &Pubkey,
    kind: AuthorityKind,
) -> Result<Instruction, TransactionBuilderError> {
    spl_token::instruction::set_authority(
        &spl_token::id(),
        mint,
        None,
        kind.as_spl(),
        current_authority,
        &[],
    )
    .map_err(|e| TransactionBuilderError::instruction_failed("spl_token", e.to_string()))
}

/// Metaplex metadata account v3 for a fungible token, creator = `user`
pub fn create_metadata_instruction(
    mint: &Pubkey,
    user: &Pubkey,
    name: &str,
    symbol: &str,
    uri: &str,
    is_mutable: bool,
) -> Instruction {
    let (metadata, _) = Metadata::find_pda(mint);
    CreateMetadataAccountV3Builder::new()
        .metadata(metadata)
        .mint(*mint)
        .mint_authority(*user)
        .payer(*user)
        .update_authority(*user, true)
        .data(DataV2 {
            name: name.to_string(),
            symbol: symbol.to_string(),
            uri: uri.to_string(),
            seller_fee_basis_points: 0,
            creators: Some(vec![Creator {
                address: *user,
                verified: true,
                share: 100,
            }]),
            collection: None,
            uses: None,
        })
        .is_mutable(is_mutable)
        .instruction()
}

/// Plan the full token creation transaction.
///
/// Order: create mint account, initialize mint, creator ATA, mint supply,
/// metadata, then the optional revocations. Revocations must come after the
/// metadata instruction, which needs the mint authority as signer.
pub fn plan_create_token_instructions(
    params: &CreateTokenParams,
    user: &Pubkey,
    mint: &Pubkey,
    mint_rent_lamports: u64,
) -> Result<Vec<Instruction>, TransactionBuilderError> {
    let token_program = spl_token::id();
    let mut instructions = Vec::with_capacity(7);

    instructions.push(system_instruction::create_account(
        user,
        mint,
        mint_rent_lamports,
        Mint::LEN as u64,
        &token_program,
    ));
    instructions.push(
        spl_token::instruction::initialize_mint(
            &token_program,
            mint,
            user,
            Some(user),
            params.decimals,
        )
        .map_err(|e| TransactionBuilderError::instruction_failed("spl_token", e.to_string()))?,
    );

    let user_ata = get_associated_token_address(user, mint);
    instructions.push(create_associated_token_account(
        user,
        user,
        mint,
        &token_program,
    ));
    if params.initial_supply > 0 {
        instructions.push(
            spl_token::instruction::mint_to(
                &token_program,
                mint,
                &user_ata,
                user,
                &[],
                params.initial_supply,
            )
            .map_err(|e| TransactionBuilderError::instruction_failed("spl_token", e.to_string()))?,
        );
    }

    instructions.push(create_metadata_instruction(
        mint,
        user,
        &params.name,
        &params.symbol,
        &params.uri,
        params.is_mutable,
    ));

    if params.revoke_mint {
        instructions.push(revoke_authority_instruction(mint, user, AuthorityKind::Minting)?);
    }
    if params.revoke_freeze {
        instructions.push(revoke_authority_instruction(mint, user, AuthorityKind::Freezing)?);
    }

    Ok(instructions)
}

/// One receiver of an airdrop chunk, amount already in raw units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirdropTransfer {
    pub receiver: Pubkey,
    pub receiver_ata: Pubkey,
    pub amount: u64,
    /// The receiver's ATA does not exist yet
    pub init_ata: bool,
}

/// Instructions for one airdrop chunk: per receiver, the ATA creation (if
/// needed) immediately followed by the transfer
pub fn plan_airdrop_chunk(
    sender: &Pubkey,
    sender_ata: &Pubkey,
    mint: &Pubkey,
    transfers: &[AirdropTransfer],
) -> Result<Vec<Instruction>, TransactionBuilderError> {
    let token_program = spl_token::id();
    let mut instructions = Vec::with_capacity(transfers.len() * 2);

    for transfer in transfers {
        if transfer.init_ata {
            instructions.push(create_associated_token_account_idempotent(
                sender,
                &transfer.receiver,
                mint,
                &token_program,
            ));
        }
        instructions.push(
            spl_token::instruction::transfer(
                &token_program,
                sender_ata,
                &transfer.receiver_ata,
                sender,
                &[],
                transfer.amount,
            )
            .map_err(|e| TransactionBuilderError::instruction_failed("spl_token", e.to_string()))?,
        );
    }

    Ok(instructions)
}
