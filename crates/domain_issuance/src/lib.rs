//! Issuance Domain
//!
//! Mints the human-readable identifiers attached to a policy holder when the
//! record is first created:
//!
//! ```text
//! BS-FHLT-2024-4821     policy number: prefix, product code, issue year, random serial
//! TXN-7QK2M9XA          transaction id: 8 random characters from A-Z 0-9
//! ```
//!
//! # Uniqueness
//!
//! Uniqueness rests on two layers:
//! - **Pre-check**: the generator asks an [`ExistenceCheck`] about each
//!   candidate, under a per-attempt timeout, with a bounded attempt budget
//! - **Commit**: the [`PolicyHolderStore`] insert rejects duplicates with a
//!   conflict, and [`RegistrationService`] mints again when that happens
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_issuance::{IdentifierGenerator, ProductCodeRegistry};
//!
//! let registry = ProductCodeRegistry::new().register("family-health", ProductCode::new("FHLT")?);
//! let generator = IdentifierGenerator::new(registry);
//! let number = generator.policy_number("family-health", &|candidate: &str| taken.contains(candidate)).await?;
//! ```

pub mod error;
pub mod generator;
pub mod ports;
pub mod registration;

pub use error::{IdentifierError, IdentifierKind, RegistrationError};
pub use generator::{
    mint_unique, IdentifierGenerator, IdentifierRequest, ProductCodeRegistry, DEFAULT_CHECK_TIMEOUT,
    DEFAULT_MAX_ATTEMPTS, SERIAL_RANGE,
};
pub use ports::{ExistenceCheck, PolicyHolderStore, PolicyNumberCheck, TransactionIdCheck};
pub use registration::{PolicyHolderRecord, RegistrationService, DEFAULT_MAX_COMMIT_ATTEMPTS};
