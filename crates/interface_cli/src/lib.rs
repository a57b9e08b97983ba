//! Command-Line Host
//!
//! Thin host around the rating engine and the identifier generator.
//!
//! # Architecture
//!
//! - **Config**: layered defaults, optional TOML file, and `RATER__*` env vars
//! - **Commands**: one plain function per subcommand
//! - **Telemetry**: `tracing` subscriber writing to stderr
//! - **Error Handling**: [`CliError`] with sysexits-style exit codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_cli::{commands, RaterConfig};
//!
//! let config = RaterConfig::load()?;
//! let result = commands::rate_request(&config.tables_path, "request.json".as_ref())?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod telemetry;

pub use commands::{ProductSummary, TablesSummary};
pub use config::{LogFormat, RaterConfig};
pub use error::{CliError, EXIT_DATA_ERR, EXIT_FAILURE, EXIT_OK, EXIT_TEMP_FAIL};
pub use telemetry::init_tracing;
