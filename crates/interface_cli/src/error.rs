//! CLI error type and process exit codes

use std::path::PathBuf;

use thiserror::Error;

use core_kernel::CoreError;
use domain_issuance::IdentifierError;
use domain_rating::{RatingError, TableError};

/// Success
pub const EXIT_OK: u8 = 0;
/// Unclassified failure
pub const EXIT_FAILURE: u8 = 1;
/// Input or table data was rejected (sysexits `EX_DATAERR`)
pub const EXIT_DATA_ERR: u8 = 65;
/// A retryable resource was exhausted (sysexits `EX_TEMPFAIL`)
pub const EXIT_TEMP_FAIL: u8 = 75;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Tables(#[from] TableError),

    #[error("Rating rejected ({code}): {0}", code = .0.code())]
    Rating(#[from] RatingError),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error("Malformed request {path}: {source}")]
    Request {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Tables(TableError::Io { .. }) => EXIT_FAILURE,
            CliError::Tables(_) | CliError::Rating(_) | CliError::Request { .. } => EXIT_DATA_ERR,
            CliError::Identifier(err) if err.is_retryable() => EXIT_TEMP_FAIL,
            CliError::Identifier(IdentifierError::InvalidProductCode(_) | IdentifierError::Format(_)) => EXIT_DATA_ERR,
            CliError::Identifier(_) | CliError::Config(_) | CliError::Io { .. } => EXIT_FAILURE,
        }
    }
}
