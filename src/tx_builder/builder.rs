//! Transaction assembly
//!
//! Turns an instruction list into an unsigned (or partially signed)
//! transaction bound to a blockhash. The wallet signature is added later by
//! the sender so that a rejection can be told apart from a build failure.

use crate::tx_builder::errors::TransactionBuilderError;
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::{v0, VersionedMessage},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::{Transaction, VersionedTransaction},
};

/// Everything needed to build one legacy transaction
#[derive(Debug)]
pub struct TxRequest {
    pub instructions: Vec<Instruction>,

    /// Keypairs that sign before the wallet (e.g. a fresh mint account)
    pub ephemeral_signers: Vec<Keypair>,

    pub fee_payer: Pubkey,
}

impl TxRequest {
    pub fn new(
        instructions: Vec<Instruction>,
        ephemeral_signers: Vec<Keypair>,
        fee_payer: Pubkey,
    ) -> Result<Self, TransactionBuilderError> {
        if instructions.is_empty() {
            return Err(TransactionBuilderError::EmptyInstructions);
        }
        Ok(Self {
            instructions,
            ephemeral_signers,
            fee_payer,
        })
    }

    /// Wallet plus ephemeral signers
    pub fn signer_count(&self) -> usize {
        self.ephemeral_signers.len() + 1
    }
}

/// Build the legacy transaction for `request` and let every ephemeral
/// signer sign it. The fee payer slot stays empty.
pub fn assemble_transaction(
    request: &TxRequest,
    blockhash: Hash,
) -> Result<Transaction, TransactionBuilderError> {
    let mut tx = Transaction::new_with_payer(&request.instructions, Some(&request.fee_payer));
    tx.message.recent_blockhash = blockhash;

    if !request.ephemeral_signers.is_empty() {
        let signers: Vec<&Keypair> = request.ephemeral_signers.iter().collect();
        tx.try_partial_sign(&signers, blockhash)
            .map_err(|e| TransactionBuilderError::EphemeralSigning(e.to_string()))?;
    }

    Ok(tx)
}

/// Compile a v0 transaction with empty signature slots, ready for a batch
/// signing request
pub fn assemble_versioned_transaction(
    payer: &Pubkey,
    instructions: &[Instruction],
    blockhash: Hash,
) -> Result<VersionedTransaction, TransactionBuilderError> {
    if instructions.is_empty() {
        return Err(TransactionBuilderError::EmptyInstructions);
    }
    let message = v0::Message::try_compile(payer, instructions, &[], blockhash)
        .map_err(|e| TransactionBuilderError::instruction_failed("v0_message", e.to_string()))?;
    let required = message.header.num_required_signatures as usize;

    Ok(VersionedTransaction {
        signatures: vec![Signature::default(); required],
        message: VersionedMessage::V0(message),
    })
}

/// Wire bytes of a signed transaction. Legacy transactions are encoded the
/// same way as their versioned form.
pub fn serialize_transaction(
    tx: &VersionedTransaction,
) -> Result<Vec<u8>, TransactionBuilderError> {
    bincode::serialize(tx).map_err(|e| TransactionBuilderError::Serialization(e.to_string()))
}
