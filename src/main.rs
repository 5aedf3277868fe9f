//! Fork faucet CLI.
//!
//! Hands out ERC-20 tokens on a forked development node by impersonating a
//! known holder ("whale"). Intended for Hardhat or Anvil nodes only.
//!
//! ```text
//! fork-faucet get-usdc --amount 1000 [--address 0x...]
//! fork-faucet check-usdc [--address 0x...]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use fork_faucet::config::{load_config, validate_config, ConfigError, FaucetConfig};
use fork_faucet::observability::init_logging;
use fork_faucet::tasks::{parse_address, Faucet, TaskError};
use fork_faucet::NodeClient;

#[derive(Parser)]
#[command(name = "fork-faucet")]
#[command(about = "Fund accounts on a forked development node from a token whale", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "FORK_FAUCET_CONFIG")]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint of the node (overrides the config file)
    #[arg(long, env = "FORK_FAUCET_RPC_URL")]
    rpc_url: Option<String>,

    /// Log level (overrides the config file; RUST_LOG wins over both)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get USDC tokens for testing
    GetUsdc {
        /// The address to receive USDC (defaults to Account #0)
        #[arg(long)]
        address: Option<String>,

        /// Amount of USDC to get (in USDC units, not wei)
        #[arg(long)]
        amount: u64,
    },
    /// Check USDC balance of an address
    CheckUsdc {
        /// The address to check (defaults to Account #0)
        #[arg(long)]
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Task failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String, TaskError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FaucetConfig::default(),
    };
    if let Some(rpc_url) = cli.rpc_url {
        config.node.rpc_url = rpc_url;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability.log_level);
    tracing::debug!(
        rpc_url = %config.node.rpc_url,
        namespace = ?config.node.rpc_namespace,
        token = %config.token.address,
        holder = %config.token.holder,
        "Configuration loaded"
    );

    let client = NodeClient::new(config.node.clone(), config.retries.clone()).await?;
    let faucet = Faucet::new(Arc::new(client), &config)?;

    match cli.command {
        Commands::GetUsdc { address, amount } => {
            let address = address.as_deref().map(parse_address).transpose()?;
            let report = faucet.get_tokens(address, amount).await?;
            Ok(report.to_string())
        }
        Commands::CheckUsdc { address } => {
            let address = address.as_deref().map(parse_address).transpose()?;
            let report = faucet.check_balance(address).await?;
            Ok(report.to_string())
        }
    }
}
