//! Token Launcher CLI
//!
//! Creates SPL tokens with Metaplex metadata, revokes mint and freeze
//! authorities, airdrops tokens in batches and lists the wallet's tokens.
//! Configuration comes from `config.toml`, `.env` and the environment.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use token_launcher::explorer::{explore_link, LinkKind};
use token_launcher::ipfs::PinataStorage;
use token_launcher::metrics::metrics;
use token_launcher::types::{
    AirdropInput, AirdropReceiver, CreateTokenInput, RevokeTokenAuthorityInput, SocialLinks,
};
use token_launcher::wallet::{KeypairWallet, ProviderSource};
use token_launcher::{Config, TokenEngine};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Keypair file, overrides `wallet.keypair_path`
    #[arg(short, long, env = "KEYPAIR_PATH")]
    keypair: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a fungible token and mint its initial supply
    CreateToken {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value_t = 9)]
        decimals: u8,
        /// Initial supply in whole tokens
        #[arg(long, default_value_t = 0.0)]
        supply: f64,
        #[arg(long, default_value = "")]
        image: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Make the metadata immutable
        #[arg(long)]
        immutable: bool,
        #[arg(long)]
        revoke_mint: bool,
        #[arg(long)]
        revoke_freeze: bool,
        #[arg(long)]
        website: Option<String>,
        #[arg(long)]
        twitter: Option<String>,
        #[arg(long)]
        telegram: Option<String>,
        #[arg(long)]
        discord: Option<String>,
    },

    /// Revoke the mint and/or freeze authority of a token
    Revoke {
        mint: String,
        #[arg(long)]
        minting: bool,
        #[arg(long)]
        freezing: bool,
    },

    /// Airdrop tokens to the receivers listed in a JSON file
    /// (`[{"wallet": "...", "amount": 1.5}, ...]`)
    Airdrop { mint: String, receivers: String },

    /// List the fungible tokens held by the wallet
    Tokens,

    /// Print the explorer link of an address or signature
    Link {
        address: String,
        #[arg(long, default_value = "tx")]
        kind: LinkKind,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.json_logs)?;

    let mut config = load_config(&args.config)?;
    if let Some(path) = &args.keypair {
        config.wallet.keypair_path = path.clone();
    }
    let in_production = config.network.in_production;

    if let Command::Link { address, kind } = &args.command {
        println!("{}", explore_link(address, *kind, in_production));
        return Ok(());
    }

    let engine = build_engine(config)?;

    match args.command {
        Command::CreateToken {
            name,
            symbol,
            decimals,
            supply,
            image,
            description,
            immutable,
            revoke_mint,
            revoke_freeze,
            website,
            twitter,
            telegram,
            discord,
        } => {
            let outcome = engine
                .create_token(CreateTokenInput {
                    name,
                    symbol,
                    image,
                    decimals,
                    description,
                    supply,
                    immutable,
                    revoke_mint,
                    revoke_freeze,
                    social_links: SocialLinks {
                        website,
                        twitter,
                        telegram,
                        discord,
                    },
                })
                .await?;
            print_json(&outcome)?;
            println!("{}", explore_link(&outcome.tx_signature, LinkKind::Tx, in_production));
        }
        Command::Revoke {
            mint,
            minting,
            freezing,
        } => {
            let outcome = engine
                .revoke_authority(RevokeTokenAuthorityInput {
                    mint,
                    minting,
                    freezing,
                })
                .await?;
            print_json(&outcome)?;
            println!("{}", explore_link(&outcome.tx_signature, LinkKind::Tx, in_production));
        }
        Command::Airdrop { mint, receivers } => {
            let content = std::fs::read_to_string(&receivers)
                .with_context(|| format!("Failed to read receivers file: {}", receivers))?;
            let receivers: Vec<AirdropReceiver> =
                serde_json::from_str(&content).context("Failed to parse receivers JSON")?;
            info!(count = receivers.len(), "Starting airdrop");

            let outcome = engine.airdrop(AirdropInput { mint, receivers }).await?;
            if !outcome.fail_tx_receivers.is_empty() {
                warn!(
                    failed = outcome.fail_tx_receivers.len(),
                    "Some receivers were not paid"
                );
            }
            print_json(&outcome)?;
        }
        Command::Tokens => {
            let tokens = engine.get_all_tokens().await?;
            print_json(&tokens)?;
        }
        Command::Link { .. } => {}
    }

    match metrics().gather_text() {
        Ok(text) => debug!(metrics = %text, "Session metrics"),
        Err(e) => warn!(error = %e, "Failed to export metrics"),
    }

    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "token_launcher=debug,info"
    } else {
        "token_launcher=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()?;
    }

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        warn!("Config file '{}' not found, using defaults", path);
        Ok(Config::from_env())
    }
}

fn build_engine(config: Config) -> Result<TokenEngine> {
    info!("Loading wallet from: {}", config.wallet.keypair_path);
    let wallet = KeypairWallet::from_file(&expand_home(&config.wallet.keypair_path))
        .context("Failed to load wallet")?;

    let endpoint = config.rpc_endpoint().to_string();
    info!(endpoint = %endpoint, production = config.network.in_production, "Connecting");

    let timeout = Duration::from_secs(config.network.timeout_secs);
    let storage = PinataStorage::new(&config.metadata, timeout)?;
    let source = ProviderSource::wallet(Arc::new(wallet), endpoint);
    Ok(TokenEngine::new(source, Arc::new(storage), config))
}

fn expand_home(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home, rest),
        _ => path.to_string(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
