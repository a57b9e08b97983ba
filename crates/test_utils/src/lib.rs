//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! premium rating workspace test suites.
//!
//! # Modules
//!
//! - `fixtures`: Fixture rate tables, requests and identifiers
//! - `builders`: Builder patterns for requests and single-product tables
//! - `assertions`: Breakdown and identifier-format assertions
//! - `generators`: Property-based request generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
