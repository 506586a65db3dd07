//! Transaction Builder
//!
//! ## Architecture
//!
//! - **errors**: error taxonomy, mapped onto the flat `Web3Error` codes
//! - **instructions**: instruction planning for create, revoke and airdrop
//! - **builder**: assembly of legacy and v0 transactions
//! - **sender**: signing, submission with a single retry, batch submission
//!
//! Instructions are planned as plain values and passed down explicitly:
//! there is no shared accumulator between operations, so concurrent engine
//! calls never see each other's instructions.

pub mod errors;
pub use errors::TransactionBuilderError;

pub mod builder;
pub mod instructions;
pub mod sender;

pub use builder::{assemble_transaction, assemble_versioned_transaction, serialize_transaction, TxRequest};
pub use instructions::{
    create_metadata_instruction, plan_airdrop_chunk, plan_create_token_instructions,
    revoke_authority_instruction, AirdropTransfer, AuthorityKind, CreateTokenParams,
};
pub use sender::{SendOptions, TxSender};
