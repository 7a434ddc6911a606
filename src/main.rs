//! Guardian relay (v1)
//!
//! Replaces the client key of a user's multisig wallet, acting as the
//! wallet's guardian.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI command
//!       │
//!       ▼
//!   ┌──────────────┐    ┌──────────────┐    ┌──────────────────┐
//!   │    config    │───▶│   recovery   │───▶│    blockchain    │───▶ JSON-RPC
//!   │ (TOML + env) │    │ orchestrator │    │ client + signer  │
//!   └──────────────┘    └──────┬───────┘    └──────────────────┘
//!                              │                     ▲
//!                              ▼                     │
//!                       ┌──────────────┐    ┌────────┴─────────┐
//!                       │    store     │    │    resilience    │
//!                       │ user records │    │ gas + retry loop │
//!                       └──────────────┘    └──────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};
use serde::Serialize;

use guardian_relay::blockchain::{AlloyChainClient, ChainClient, GuardianSigner};
use guardian_relay::config::{load_config, GuardianConfig};
use guardian_relay::observability::{logging, metrics};
use guardian_relay::recovery::{
    migrate_wallet_bindings, GuardianIdentity, RecoveryOrchestrator, RecoveryResponse, Reconciler,
    WalletBinding,
};
use guardian_relay::resilience::{EscalationPolicy, GasEscalationExecutor};
use guardian_relay::store::{MemoryUserStore, UserStore};

#[derive(Parser)]
#[command(name = "guardian-relay")]
#[command(about = "Guardian-driven client key recovery for multisig wallets", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the guardian address
    Address,
    /// Replace the client of a user's wallet
    Recover {
        #[arg(long)]
        record_id: String,
        #[arg(long)]
        new_client: Address,
    },
    /// Rebind user records to wallets from a JSON file
    Migrate {
        #[arg(long)]
        file: PathBuf,
    },
    /// Repair a user record that lags the ledger
    Reconcile {
        #[arg(long)]
        record_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GuardianConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("guardian-relay v0.1.0 starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let signer = GuardianSigner::from_env(&config.signer.private_key_env)?;
    let chain_signer = signer.clone();
    let guardian = Arc::new(GuardianIdentity::new(Arc::new(signer)));
    tracing::info!(guardian = %guardian.address(), "Guardian key loaded");

    let store = Arc::new(match &config.store.path {
        Some(path) => MemoryUserStore::load_from_file(path)?,
        None => MemoryUserStore::new(None),
    });

    match cli.command {
        Commands::Address => {
            print_json(&serde_json::json!({ "address": guardian.address() }))?;
        }
        Commands::Recover {
            record_id,
            new_client,
        } => {
            let chain: Arc<dyn ChainClient> = Arc::new(connect(&config, &chain_signer).await?);
            let orchestrator = RecoveryOrchestrator::new(
                chain,
                guardian,
                store as Arc<dyn UserStore>,
                GasEscalationExecutor::new(EscalationPolicy::from(&config.retries)),
            );
            let result = orchestrator.execute_recovery(&record_id, new_client).await;
            let response = RecoveryResponse::from(&result);
            print_json(&response)?;
            if !response.is_success() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Migrate { file } => {
            let bindings = read_bindings(&file)?;
            let results = migrate_wallet_bindings(store.as_ref(), bindings, config.batch.concurrency).await;
            print_json(&results)?;
        }
        Commands::Reconcile { record_id } => {
            let chain: Arc<dyn ChainClient> = Arc::new(connect(&config, &chain_signer).await?);
            let reconciler = Reconciler::new(chain, store as Arc<dyn UserStore>);
            let status = reconciler.reconcile(&record_id).await?;
            print_json(&status)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Build the ledger client and check the endpoint before any recovery runs.
async fn connect(
    config: &GuardianConfig,
    signer: &GuardianSigner,
) -> Result<AlloyChainClient, Box<dyn std::error::Error>> {
    let client = AlloyChainClient::new(config.chain.clone(), signer)?;
    if !client.is_healthy().await {
        tracing::warn!(rpc_url = %config.chain.rpc_url, "Ledger endpoint not healthy at startup");
    }
    Ok(client)
}

fn read_bindings(path: &Path) -> Result<Vec<WalletBinding>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
