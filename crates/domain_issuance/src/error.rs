//! Issuance domain errors

use std::fmt;

use core_kernel::{IdentifierFormatError, PortError};
use thiserror::Error;

/// Which identifier family an operation was minting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    PolicyNumber,
    TransactionId,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::PolicyNumber => f.write_str("policy number"),
            IdentifierKind::TransactionId => f.write_str("transaction id"),
        }
    }
}

/// Errors raised while minting identifiers
#[derive(Debug, Error)]
pub enum IdentifierError {
    /// The product has no registered product code
    #[error("No product code is registered for product '{0}'")]
    InvalidProductCode(String),

    /// Every attempt produced a taken candidate, timed out, or hit a transient store failure
    #[error("Could not mint a unique {kind} after {attempts} attempts")]
    Exhausted { kind: IdentifierKind, attempts: u32 },

    /// The existence check failed with a non-transient error
    #[error("Identifier store error: {0}")]
    Store(#[source] PortError),

    /// The generator was configured with a malformed prefix or code
    #[error(transparent)]
    Format(#[from] IdentifierFormatError),
}

impl IdentifierError {
    /// True for the resource-exhaustion class a caller may retry later
    pub fn is_retryable(&self) -> bool {
        match self {
            IdentifierError::Exhausted { .. } => true,
            IdentifierError::Store(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            IdentifierError::InvalidProductCode(_) => "invalid_product_code",
            IdentifierError::Exhausted { .. } => "identifier_exhausted",
            IdentifierError::Store(_) => "identifier_store_error",
            IdentifierError::Format(_) => "identifier_format",
        }
    }
}

/// Errors raised while registering a policy holder
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// Every commit attempt lost a uniqueness race
    #[error("Policy holder registration conflicted on {attempts} consecutive commits")]
    Exhausted { attempts: u32 },

    #[error("Policy holder store error: {0}")]
    Store(#[source] PortError),
}

impl RegistrationError {
    pub fn is_retryable(&self) -> bool {
        match self {
            RegistrationError::Identifier(err) => err.is_retryable(),
            RegistrationError::Exhausted { .. } => true,
            RegistrationError::Store(err) => err.is_transient(),
        }
    }
}
