//! Pre-flight checks on fetched token state
//!
//! Pure decisions over accounts the engine has already fetched. Only the
//! fetch is retried; re-running a check against unchanged state yields the
//! same result.

use solana_sdk::{account::Account, program_pack::Pack, pubkey::Pubkey};
use spl_token::{
    solana_program::program_option::COption,
    state::{Account as TokenAccount, Mint},
};

use crate::errors::{Web3Error, Web3Result};
use crate::tx_builder::AuthorityKind;

/// Decode a mint account, requiring SPL Token ownership and the exact mint
/// layout size
pub fn decode_mint(account: Option<&Account>) -> Web3Result<Mint> {
    let account = account.ok_or(Web3Error::TokenNotFound)?;
    if account.owner != spl_token::id() || account.data.len() != Mint::LEN {
        return Err(Web3Error::TokenNotFound);
    }
    Mint::unpack(&account.data).map_err(|_| Web3Error::TokenNotFound)
}

/// Decode an SPL token account; `None` when missing or malformed
pub fn decode_token_account(account: Option<&Account>) -> Option<TokenAccount> {
    let account = account?;
    if account.owner != spl_token::id() || account.data.len() != TokenAccount::LEN {
        return None;
    }
    TokenAccount::unpack(&account.data).ok()
}

/// Current holder of an authority, `None` once revoked
pub fn authority_of(mint: &Mint, kind: AuthorityKind) -> Option<Pubkey> {
    let authority = match kind {
        AuthorityKind::Minting => mint.mint_authority,
        AuthorityKind::Freezing => mint.freeze_authority,
    };
    match authority {
        COption::Some(key) => Some(key),
        COption::None => None,
    }
}

/// `user` may revoke the authority: it is still set and held by `user`
pub fn check_authority(mint: &Mint, kind: AuthorityKind, user: &Pubkey) -> Web3Result<()> {
    match authority_of(mint, kind) {
        None => Err(Web3Error::AuthorityAlreadyRevoked),
        Some(holder) if holder != *user => Err(Web3Error::Unauthorised),
        Some(_) => Ok(()),
    }
}

/// Authorities to revoke, checked minting first. An empty request has
/// nothing left to revoke.
pub fn plan_revocations(
    mint: &Mint,
    user: &Pubkey,
    minting: bool,
    freezing: bool,
) -> Web3Result<Vec<AuthorityKind>> {
    let mut kinds = Vec::with_capacity(2);
    if minting {
        check_authority(mint, AuthorityKind::Minting, user)?;
        kinds.push(AuthorityKind::Minting);
    }
    if freezing {
        check_authority(mint, AuthorityKind::Freezing, user)?;
        kinds.push(AuthorityKind::Freezing);
    }
    if kinds.is_empty() {
        return Err(Web3Error::AuthorityAlreadyRevoked);
    }
    Ok(kinds)
}

/// The sender's token account holds at least `required` raw units
pub fn check_sender_balance(sender_account: Option<&Account>, required: u64) -> Web3Result<TokenAccount> {
    let token_account = decode_token_account(sender_account).ok_or(Web3Error::NotEnoughToken)?;
    if token_account.amount < required {
        return Err(Web3Error::NotEnoughToken);
    }
    Ok(token_account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mint_account, token_account};

    #[test]
    fn test_decode_mint_rejects_wrong_owner_and_size() {
        let user = Pubkey::new_unique();
        let mut account = mint_account(Some(user), Some(user), 6, 0);
        assert_eq!(decode_mint(Some(&account)).unwrap().decimals, 6);

        account.owner = Pubkey::new_unique();
        assert_eq!(decode_mint(Some(&account)), Err(Web3Error::TokenNotFound));

        let mut short = mint_account(Some(user), Some(user), 6, 0);
        short.data.truncate(Mint::LEN - 1);
        assert_eq!(decode_mint(Some(&short)), Err(Web3Error::TokenNotFound));

        assert_eq!(decode_mint(None), Err(Web3Error::TokenNotFound));
    }

    #[test]
    fn test_revoked_authority_is_reported_first() {
        let user = Pubkey::new_unique();
        let mint = decode_mint(Some(&mint_account(None, Some(Pubkey::new_unique()), 9, 0))).unwrap();

        assert_eq!(
            plan_revocations(&mint, &user, true, true),
            Err(Web3Error::AuthorityAlreadyRevoked)
        );
        // freezing authority belongs to someone else
        assert_eq!(
            plan_revocations(&mint, &user, false, true),
            Err(Web3Error::Unauthorised)
        );
    }

    #[test]
    fn test_revocations_in_order() {
        let user = Pubkey::new_unique();
        let mint = decode_mint(Some(&mint_account(Some(user), Some(user), 9, 0))).unwrap();

        assert_eq!(
            plan_revocations(&mint, &user, true, true).unwrap(),
            vec![AuthorityKind::Minting, AuthorityKind::Freezing]
        );
        assert_eq!(
            plan_revocations(&mint, &user, false, false),
            Err(Web3Error::AuthorityAlreadyRevoked)
        );
    }

    #[test]
    fn test_check_is_repeatable() {
        let user = Pubkey::new_unique();
        let account = mint_account(None, Some(user), 9, 0);
        let first = decode_mint(Some(&account)).and_then(|m| plan_revocations(&m, &user, true, false));
        let second = decode_mint(Some(&account)).and_then(|m| plan_revocations(&m, &user, true, false));
        assert_eq!(first, second);
    }

    #[test]
    fn test_sender_balance() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let account = token_account(&mint, &owner, 100);

        assert!(check_sender_balance(Some(&account), 100).is_ok());
        assert_eq!(
            check_sender_balance(Some(&account), 101).err(),
            Some(Web3Error::NotEnoughToken)
        );
        assert_eq!(check_sender_balance(None, 1).err(), Some(Web3Error::NotEnoughToken));
    }
}
