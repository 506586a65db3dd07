//! Configuration module for the token launcher
//!
//! This module handles configuration loading from TOML files, `.env` files
//! and environment variables, and resolves which RPC endpoint to talk to.

use serde::{Deserialize, Serialize};

pub const RPC_ENDPOINT_MAIN: &str = "https://api.mainnet-beta.solana.com";
pub const RPC_ENDPOINT_DEV: &str = "https://api.devnet.solana.com";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network selection
    #[serde(default)]
    pub network: NetworkConfig,

    /// Wallet configuration
    #[serde(default)]
    pub wallet: WalletConfig,

    /// Metadata pinning service
    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Transaction submission policy
    #[serde(default)]
    pub transaction: TransactionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Production (mainnet) vs development (devnet) network
    #[serde(default)]
    pub in_production: bool,

    #[serde(default = "default_main_endpoint")]
    pub rpc_endpoint_main: String,

    #[serde(default = "default_dev_endpoint")]
    pub rpc_endpoint_dev: String,

    /// Overrides both endpoints when set
    #[serde(default)]
    pub testing_endpoint: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to keypair file
    #[serde(default = "default_keypair_path")]
    pub keypair_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub pinata_api_key: Option<String>,

    #[serde(default)]
    pub pinata_api_secret_key: Option<String>,

    /// Gateway domain used to build metadata URIs
    #[serde(default)]
    pub pinata_domain: Option<String>,

    /// Skip pinning the JSON metadata (the uri then points at `null`)
    #[serde(default)]
    pub skip_deploy_json_metadata: bool,
}

impl MetadataConfig {
    pub const DEFAULT_GATEWAY: &'static str = "gateway.pinata.cloud";

    pub fn gateway_domain(&self) -> &str {
        self.pinata_domain
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(Self::DEFAULT_GATEWAY)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Delay before the single retry of a failed submission or fetch
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Receivers per airdrop transaction
    #[serde(default = "default_airdrop_chunk_size")]
    pub airdrop_chunk_size: usize,

    /// Log underlying errors of failed submissions. Defaults to
    /// "not in production" when unset.
    #[serde(default)]
    pub log_errors: Option<bool>,
}

// Default value functions
fn default_main_endpoint() -> String { RPC_ENDPOINT_MAIN.to_string() }
fn default_dev_endpoint() -> String { RPC_ENDPOINT_DEV.to_string() }
fn default_rpc_timeout() -> u64 { 30 }
fn default_keypair_path() -> String { "~/.config/solana/id.json".to_string() }
fn default_retry_delay_ms() -> u64 { 2_000 }
fn default_airdrop_chunk_size() -> usize { 10 }

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            in_production: false,
            rpc_endpoint_main: default_main_endpoint(),
            rpc_endpoint_dev: default_dev_endpoint(),
            testing_endpoint: None,
            timeout_secs: default_rpc_timeout(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keypair_path: default_keypair_path(),
        }
    }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            airdrop_chunk_size: default_airdrop_chunk_size(),
            log_errors: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            wallet: WalletConfig::default(),
            metadata: MetadataConfig::default(),
            transaction: TransactionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with `.env` and environment variable overrides
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Defaults plus `.env` and environment variable overrides
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Recognised keys: `PRODUCTION`, `TESTING_ENDPOINT`, `PINATA_API_KEY`,
    /// `PINATA_API_SECRET_KEY`, `PINATA_DOMAIN`, `SKIP_DEPLOY_JSON_METADATA`.
    /// Flags are enabled only by the value `1`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PRODUCTION") {
            self.network.in_production = v == "1";
        }
        if let Some(v) = lookup("TESTING_ENDPOINT").filter(|v| !v.is_empty()) {
            self.network.testing_endpoint = Some(v);
        }
        if let Some(v) = lookup("PINATA_API_KEY") {
            self.metadata.pinata_api_key = Some(v);
        }
        if let Some(v) = lookup("PINATA_API_SECRET_KEY") {
            self.metadata.pinata_api_secret_key = Some(v);
        }
        if let Some(v) = lookup("PINATA_DOMAIN") {
            self.metadata.pinata_domain = Some(v);
        }
        if let Some(v) = lookup("SKIP_DEPLOY_JSON_METADATA") {
            self.metadata.skip_deploy_json_metadata = v == "1";
        }
    }

    /// Endpoint the RPC client connects to
    pub fn rpc_endpoint(&self) -> &str {
        if let Some(testing) = &self.network.testing_endpoint {
            return testing;
        }
        if self.network.in_production {
            &self.network.rpc_endpoint_main
        } else {
            &self.network.rpc_endpoint_dev
        }
    }

    /// Whether underlying errors of failed operations get logged
    pub fn log_errors(&self) -> bool {
        self.transaction
            .log_errors
            .unwrap_or(!self.network.in_production)
    }

    pub fn retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.transaction.retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.rpc_endpoint(), RPC_ENDPOINT_DEV);
        assert_eq!(config.transaction.retry_delay_ms, 2_000);
        assert_eq!(config.transaction.airdrop_chunk_size, 10);
        assert!(config.log_errors());
        assert!(!config.metadata.skip_deploy_json_metadata);
    }

    #[test]
    fn test_production_selects_mainnet() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup(&[("PRODUCTION", "1")]));
        assert_eq!(config.rpc_endpoint(), RPC_ENDPOINT_MAIN);
        assert!(!config.log_errors());
    }

    #[test]
    fn test_testing_endpoint_overrides_network() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup(&[
            ("PRODUCTION", "1"),
            ("TESTING_ENDPOINT", "http://127.0.0.1:8899"),
        ]));
        assert_eq!(config.rpc_endpoint(), "http://127.0.0.1:8899");
    }

    #[test]
    fn test_flags_require_literal_one() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup(&[
            ("PRODUCTION", "true"),
            ("SKIP_DEPLOY_JSON_METADATA", "1"),
            ("PINATA_DOMAIN", "gateway.example.com"),
        ]));
        assert!(!config.network.in_production);
        assert!(config.metadata.skip_deploy_json_metadata);
        assert_eq!(
            config.metadata.pinata_domain.as_deref(),
            Some("gateway.example.com")
        );
    }

    #[test]
    fn test_from_file_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[network]
in_production = true

[transaction]
retry_delay_ms = 500
log_errors = true
"#
        )
        .unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.rpc_endpoint(), RPC_ENDPOINT_MAIN);
        assert_eq!(config.retry_delay(), std::time::Duration::from_millis(500));
        assert_eq!(config.transaction.airdrop_chunk_size, 10);
        assert!(config.log_errors());
    }
}
