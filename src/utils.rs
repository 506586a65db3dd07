//! Parsing and unit conversion helpers

use solana_sdk::{pubkey::Pubkey, signature::Keypair};
use std::str::FromStr;

use crate::errors::{Web3Error, Web3Result};

/// Parse a base58 public key
pub fn pubkey_from_str(key: &str) -> Web3Result<Pubkey> {
    Pubkey::from_str(key.trim()).map_err(|_| Web3Error::InvalidPubkeyStr)
}

/// Parse a base58 encoded 64-byte secret key
pub fn keypair_from_str(secret: &str) -> Option<Keypair> {
    let bytes = bs58::decode(secret.trim()).into_vec().ok()?;
    Keypair::try_from(bytes.as_slice()).ok()
}

pub fn generate_keypairs(count: usize) -> Vec<Keypair> {
    (0..count).map(|_| Keypair::new()).collect()
}

/// Convert a UI amount into raw token units, truncating the fraction.
///
/// Returns `None` for negative, non-finite or overflowing values.
pub fn calc_non_decimal_value(value: f64, decimals: u8) -> Option<u64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let scaled = (value * 10f64.powi(decimals as i32)).trunc();
    if scaled >= u64::MAX as f64 {
        return None;
    }
    Some(scaled as u64)
}

/// Convert raw token units into a UI amount
pub fn calc_decimal_value(value: u64, decimals: u8) -> f64 {
    value as f64 / 10f64.powi(decimals as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signer;

    #[test]
    fn test_pubkey_from_str() {
        let key = Pubkey::new_unique();
        assert_eq!(pubkey_from_str(&key.to_string()).unwrap(), key);
        assert_eq!(pubkey_from_str("not-a-key"), Err(Web3Error::InvalidPubkeyStr));
        assert_eq!(pubkey_from_str(""), Err(Web3Error::InvalidPubkeyStr));
    }

    #[test]
    fn test_keypair_from_str() {
        let keypair = Keypair::new();
        let encoded = bs58::encode(keypair.to_bytes()).into_string();
        assert_eq!(keypair_from_str(&encoded).unwrap().pubkey(), keypair.pubkey());
        assert!(keypair_from_str("abc").is_none());
    }

    #[test]
    fn test_non_decimal_value_truncates() {
        assert_eq!(calc_non_decimal_value(1000.0, 9), Some(1_000_000_000_000));
        assert_eq!(calc_non_decimal_value(1.5, 0), Some(1));
        assert_eq!(calc_non_decimal_value(0.123456789, 6), Some(123_456));
        assert_eq!(calc_non_decimal_value(0.0, 9), Some(0));
    }

    #[test]
    fn test_non_decimal_value_rejects_out_of_range() {
        assert_eq!(calc_non_decimal_value(-1.0, 9), None);
        assert_eq!(calc_non_decimal_value(f64::NAN, 9), None);
        assert_eq!(calc_non_decimal_value(1e12, 9), None);
    }

    #[test]
    fn test_decimal_value() {
        assert_eq!(calc_decimal_value(1_500_000_000, 9), 1.5);
        assert_eq!(calc_decimal_value(42, 0), 42.0);
        assert_eq!(generate_keypairs(3).len(), 3);
    }
}
