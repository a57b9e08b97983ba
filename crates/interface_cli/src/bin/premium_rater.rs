//! Premium Rater - Command-Line Binary
//!
//! # Usage
//!
//! ```bash
//! # Check a rate table document
//! premium-rater validate-tables --tables config/rate-tables.json
//!
//! # Price a request
//! premium-rater rate --request config/sample-request.json
//!
//! # Mint identifiers, avoiding ones listed in a file
//! premium-rater policy-number --product family-health --existing issued.txt
//! premium-rater transaction-id
//! ```
//!
//! # Environment Variables
//!
//! * `RATER__TABLES_PATH` - Rate table document (default: config/rate-tables.json)
//! * `RATER__POLICY_PREFIX` - Policy-number prefix (default: BS)
//! * `RATER__MAX_ATTEMPTS` - Identifier attempts before giving up (default: 10)
//! * `RATER__CHECK_TIMEOUT_MS` - Existence-check timeout (default: 2000)
//! * `RATER__LOG_LEVEL` - Log filter when `RUST_LOG` is unset (default: info)
//! * `RATER__LOG_FORMAT` - `text` or `json` (default: text)

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use interface_cli::{commands, init_tracing, CliError, RaterConfig, EXIT_FAILURE};

#[derive(Debug, Parser)]
#[command(name = "premium-rater", version, about = "Health insurance premium rating and identifier minting")]
struct Cli {
    /// Rate table document, overriding configuration
    #[arg(long, global = true, env = "RATER_TABLES")]
    tables: Option<PathBuf>,

    /// Configuration file, without extension
    #[arg(long, global = true, default_value = interface_cli::config::CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and validate the rate tables, then print a summary
    ValidateTables,

    /// Price a JSON rating request
    Rate {
        /// Request file
        #[arg(long)]
        request: PathBuf,
    },

    /// Mint a unique policy number for a product
    PolicyNumber {
        /// Product id from the rate tables
        #[arg(long)]
        product: String,

        /// File of policy numbers already issued, one per line
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Issue year, defaulting to the current year
        #[arg(long)]
        year: Option<u16>,
    },

    /// Mint a unique transaction id
    TransactionId {
        /// File of transaction ids already issued, one per line
        #[arg(long)]
        existing: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<CliError>()
                .map_or(EXIT_FAILURE, CliError::exit_code);
            tracing::error!(error = %err, exit_code = code, "Command failed");
            eprintln!("error: {err:#}");
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = RaterConfig::load_from(&cli.config).map_err(CliError::from)?;
    if let Some(tables) = cli.tables {
        config.tables_path = tables;
    }

    init_tracing(&config.log_level, config.log_format);
    tracing::debug!(tables = %config.tables_path.display(), "Configuration loaded");

    match cli.command {
        Command::ValidateTables => {
            let summary = commands::validate_tables(&config.tables_path)?;
            print_json(&summary)?;
        }
        Command::Rate { request } => {
            let result = commands::rate_request(&config.tables_path, &request)?;
            print_json(&result)?;
        }
        Command::PolicyNumber {
            product,
            existing,
            year,
        } => {
            let number = commands::mint_policy_number(
                &config,
                &config.tables_path,
                &product,
                existing.as_deref(),
                year,
            )
            .await?;
            println!("{number}");
        }
        Command::TransactionId { existing } => {
            let id = commands::mint_transaction_id(&config, existing.as_deref()).await?;
            println!("{id}");
        }
    }
    Ok(())
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{rendered}");
    Ok(())
}
