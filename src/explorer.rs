//! Solscan links for addresses and transactions

use std::fmt;

const EXPLORER_BASE: &str = "https://solscan.io";

/// Path segment of an explorer link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Tx,
    Token,
    Account,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Tx => "tx",
            LinkKind::Token => "token",
            LinkKind::Account => "account",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tx" => Ok(LinkKind::Tx),
            "token" => Ok(LinkKind::Token),
            "account" | "address" => Ok(LinkKind::Account),
            other => Err(format!("unknown link kind: {}", other)),
        }
    }
}

/// Explorer URL, qualified with the devnet cluster outside production
pub fn explore_link(address: &str, kind: LinkKind, in_production: bool) -> String {
    let suffix = if in_production { "" } else { "/?cluster=devnet" };
    format!("{}/{}/{}{}", EXPLORER_BASE, kind, address, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_link() {
        assert_eq!(
            explore_link("abc", LinkKind::Tx, true),
            "https://solscan.io/tx/abc"
        );
    }

    #[test]
    fn test_devnet_link() {
        assert_eq!(
            explore_link("abc", LinkKind::Token, false),
            "https://solscan.io/token/abc/?cluster=devnet"
        );
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("tx".parse::<LinkKind>().unwrap(), LinkKind::Tx);
        assert_eq!("address".parse::<LinkKind>().unwrap(), LinkKind::Account);
        assert!("block".parse::<LinkKind>().is_err());
    }
}
