//! Core Kernel - Foundational types shared by the rating and issuance domains
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money and rate types with precise decimal arithmetic and whole-unit rounding
//! - Identifier types: policy numbers, transaction ids and internal record ids
//! - The port error type used by every persistence-facing trait

pub mod money;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{
    IdentifierFormatError, PolicyHolderId, PolicyNumber, ProductCode, TransactionId,
    DEFAULT_POLICY_PREFIX, TRANSACTION_PREFIX,
};
pub use ports::{DomainPort, PortError};
pub use error::CoreError;
