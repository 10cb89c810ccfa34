//! `evmscan` CLI
//!
//! Entry point for the scanner binary. Provides subcommands for:
//! - `scan` - run a single scan cycle for one contract/event pair
//! - `migrate` - run (or revert) database migrations
//! - `watch` - loop `scan` on a fixed interval

use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use evmscan::chain::AlloyChainClient;
use evmscan::config::Settings;
use evmscan::error::{InfraError, Result, ScanError};
use evmscan::scanner::{scan, ScanConfig};
use evmscan::store::PostgresProgressStore;
use evmscan::types::{EthAddress, EventSchema};
use tokio::time::sleep;
use tracing::{error, info};

/// `evmscan` — a resumable, reorg-aware event scanner for EVM chains.
#[derive(Parser, Debug)]
#[command(name = "evmscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Deployment environment (selects `config/{env}.toml`)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one scan cycle for a contract/event pair
    Scan {
        /// Contract address to scan (overrides config)
        #[arg(long)]
        contract: Option<String>,

        /// Event schema name (overrides config)
        #[arg(long)]
        event: Option<String>,
    },

    /// Run database migrations
    Migrate {
        /// Revert the last migration instead of applying pending ones
        #[arg(long)]
        revert: bool,
    },

    /// Repeatedly run `scan` on a fixed interval
    Watch {
        /// Contract address to scan (overrides config)
        #[arg(long)]
        contract: Option<String>,

        /// Event schema name (overrides config)
        #[arg(long)]
        event: Option<String>,

        /// Interval between scan cycles, in seconds (overrides config)
        #[arg(long)]
        interval: Option<u64>,
    },
}

fn init_tracing(settings: &Settings, verbose: bool) {
    let level = if verbose { "debug" } else { settings.logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if settings.logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn resolve_target(
    settings: &Settings,
    contract: Option<String>,
    event: Option<String>,
) -> Result<(EthAddress, EventSchema)> {
    let address_str = contract.unwrap_or_else(|| settings.contract.address.clone());
    let address = EthAddress::from_hex(&address_str)
        .map_err(|e| ScanError::Config(format!("invalid contract address: {e}")))?;

    let event_str = event.unwrap_or_else(|| settings.contract.event_name.clone());
    let schema = EventSchema::from_str(&event_str)
        .map_err(|e| ScanError::Config(format!("invalid event name: {e}")))?;

    Ok((address, schema))
}

async fn build_adapters(
    settings: &Settings,
) -> Result<(AlloyChainClient<impl alloy::providers::Provider + Clone>, PostgresProgressStore)> {
    let url = settings
        .chain
        .rpc_url
        .parse()
        .map_err(|e| InfraError::Rpc(Box::new(std::io::Error::other(format!("invalid RPC URL: {e}")))))?;
    let provider = alloy::providers::ProviderBuilder::new().connect_http(url);

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .min_connections(settings.database.min_connections)
        .acquire_timeout(settings.database.connect_timeout())
        .idle_timeout(settings.database.idle_timeout())
        .connect(&settings.database.url)
        .await
        .map_err(InfraError::Database)?;

    Ok((AlloyChainClient::new(provider), PostgresProgressStore::new(pool)))
}

async fn run_scan(settings: &Settings, contract: Option<String>, event: Option<String>) -> Result<()> {
    let contract_overridden = contract.is_some();
    let (address, schema) = resolve_target(settings, contract, event)?;
    let (chain, store) = build_adapters(settings).await?;

    let mut config = ScanConfig::from(settings.scanner);
    if !contract_overridden {
        config.configured_creation_block = settings.contract.configured_creation_block();
    }

    let report = scan(&chain, &store, address, schema, config).await?;

    info!(
        %address,
        event = schema.name(),
        events_persisted = report.events_persisted,
        cursor = report.cursor,
        "scan cycle complete"
    );
    Ok(())
}

async fn run_migrate(settings: &Settings, revert: bool) -> Result<()> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await
        .map_err(InfraError::Database)?;

    let store = PostgresProgressStore::new(pool);

    if revert {
        return Err(ScanError::Initialization(
            "reverting migrations is not yet implemented; use `sqlx migrate revert` directly".into(),
        ));
    }

    store.run_migrations().await
}

async fn run_watch(
    settings: &Settings,
    contract: Option<String>,
    event: Option<String>,
    interval: Option<u64>,
) -> Result<()> {
    let interval = interval.map_or_else(|| settings.scanner.poll_interval(), Duration::from_secs);

    loop {
        if let Err(err) = run_scan(settings, contract.clone(), event.clone()).await {
            error!(error = %err, "scan cycle failed, will retry next interval");
        }
        sleep(interval).await;
    }
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(&cli.environment) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return std::process::ExitCode::FAILURE;
        }
    };

    if let Err(errors) = settings.validate() {
        eprintln!("invalid configuration:");
        for error in errors {
            eprintln!("  - {error}");
        }
        return std::process::ExitCode::FAILURE;
    }

    init_tracing(&settings, cli.verbose);
    info!(version = evmscan::VERSION, "starting evmscan");

    let result = match cli.command {
        Commands::Scan { contract, event } => run_scan(&settings, contract, event).await,
        Commands::Migrate { revert } => run_migrate(&settings, revert).await,
        Commands::Watch { contract, event, interval } => {
            run_watch(&settings, contract, event, interval).await
        }
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "evmscan exited with an error");
            std::process::ExitCode::FAILURE
        }
    }
}

