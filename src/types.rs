//! Inputs and outcomes of the token engine operations

use serde::{Deserialize, Serialize};

/// Social links published in the off-chain metadata `extensions`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
}

/// Token creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTokenInput {
    pub name: String,
    pub symbol: String,
    /// Image URL stored in the off-chain metadata
    #[serde(default)]
    pub image: String,
    pub decimals: u8,
    #[serde(default)]
    pub description: String,
    /// Initial supply in UI units
    pub supply: f64,
    /// Metadata can no longer be updated
    #[serde(default)]
    pub immutable: bool,
    #[serde(default)]
    pub revoke_mint: bool,
    #[serde(default)]
    pub revoke_freeze: bool,
    #[serde(default)]
    pub social_links: SocialLinks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTokenOutcome {
    /// Base58 address of the new mint
    pub token_address: String,
    pub tx_signature: String,
}

/// Authority revocation request; `mint` is a base58 address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeTokenAuthorityInput {
    pub mint: String,
    #[serde(default)]
    pub minting: bool,
    #[serde(default)]
    pub freezing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPassResult {
    pub tx_signature: String,
}

/// One airdrop receiver; `amount` is in UI units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirdropReceiver {
    pub wallet: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirdropInput {
    pub mint: String,
    pub receivers: Vec<AirdropReceiver>,
}

/// Partial failure is a normal outcome: receivers are split by whether
/// their chunk confirmed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirdropOutcome {
    pub pass_tx_receivers: Vec<AirdropReceiver>,
    pub fail_tx_receivers: Vec<AirdropReceiver>,
    pub tx_signatures: Vec<String>,
}

/// A fungible token held by the wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserToken {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub image: String,
    pub description: String,
    pub decimals: u8,
    /// Total supply in UI units
    pub supply: f64,
    /// Wallet balance in UI units
    pub balance: f64,
    pub minting_authority: Option<String>,
    pub is_minting_auth_revoked: bool,
    pub freezing_authority: Option<String>,
    pub is_freezing_auth_revoked: bool,
}
