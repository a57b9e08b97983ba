//! Rating domain errors
//!
//! Two families: [`TableError`] is raised while loading rate tables and means
//! the configuration is unusable; [`RatingError`] is raised per request and
//! always describes something the caller can fix in the request.

use std::path::PathBuf;
use thiserror::Error;

use core_kernel::MoneyError;

/// Errors raised while loading or validating rate tables
#[derive(Debug, Error)]
pub enum TableError {
    /// The table file could not be read
    #[error("Failed to read rate tables from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The table document is not valid JSON for the schema
    #[error("Malformed rate table document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two products share an identifier
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),

    /// Two products share a policy-number product code
    #[error("Product code {code} is used by both {first} and {second}")]
    DuplicateProductCode {
        code: String,
        first: String,
        second: String,
    },

    /// A key appears twice inside one table
    #[error("{product}: duplicate key '{key}' in {table}")]
    DuplicateKey {
        product: String,
        table: &'static str,
        key: String,
    },

    /// A table that must have entries is empty
    #[error("{product}: {table} must not be empty")]
    EmptyTable {
        product: String,
        table: &'static str,
    },

    /// Age brackets leave a gap, overlap, or do not cover 0..=120
    #[error("{product}: invalid age brackets: {detail}")]
    AgeBrackets {
        product: String,
        detail: String,
    },

    /// A required lookup entry is missing
    #[error("{product}: {table} has no entry for '{key}'")]
    MissingEntry {
        product: String,
        table: String,
        key: String,
    },

    /// A table references a tier, bracket or category that is not defined
    #[error("{product}: {table} references unknown key '{key}'")]
    UnknownKey {
        product: String,
        table: String,
        key: String,
    },

    /// A scalar is out of its allowed range
    #[error("{product}: invalid {field}: {detail}")]
    InvalidValue {
        product: String,
        field: String,
        detail: String,
    },
}

impl TableError {
    pub(crate) fn missing(product: &str, table: impl Into<String>, key: &str) -> Self {
        TableError::MissingEntry {
            product: product.to_string(),
            table: table.into(),
            key: key.to_string(),
        }
    }

    pub(crate) fn unknown(product: &str, table: impl Into<String>, key: &str) -> Self {
        TableError::UnknownKey {
            product: product.to_string(),
            table: table.into(),
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid(product: &str, field: impl Into<String>, detail: impl Into<String>) -> Self {
        TableError::InvalidValue {
            product: product.to_string(),
            field: field.into(),
            detail: detail.into(),
        }
    }
}

/// Errors that reject a rating request
///
/// Every variant is a local validation failure. None of them is retried
/// automatically and none is ever swallowed by the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RatingError {
    /// The request names a product that is not in the table snapshot
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// The coverage tier key or sum insured does not resolve to a tier
    #[error("Invalid coverage tier for {product}: {requested}")]
    InvalidCoverageTier {
        product: String,
        requested: String,
    },

    /// An insured age or age-bracket key does not resolve to a bracket
    #[error("Invalid age for {product}: {requested}")]
    InvalidAge {
        product: String,
        requested: String,
    },

    /// The request has no insured members
    #[error("At least one insured member is required")]
    NoInsuredMembers,

    /// A selected feature is not offered by the product
    #[error("Unknown feature id: {0}")]
    UnknownFeatureId(String),

    /// A selected rider is not offered by the product
    #[error("Unknown rider id: {0}")]
    UnknownRiderId(String),

    /// A selected chronic condition is not covered by the product
    #[error("Unknown chronic condition id: {0}")]
    UnknownConditionId(String),

    /// The room-rent category is not defined for the product
    #[error("Unknown room-rent category: {0}")]
    UnknownRoomCategory(String),

    /// The tenure is outside the product's allowed range
    #[error("Tenure of {tenure} years is outside the allowed range {min}..={max}")]
    InvalidTenure {
        tenure: u32,
        min: u32,
        max: u32,
    },

    /// A co-payment or room-rent value is out of range
    #[error("Invalid {field}: {detail}")]
    InvalidSelection {
        field: &'static str,
        detail: String,
    },

    /// The table snapshot lacks a base premium the schema promised
    #[error("No base premium for tier {tier} and age bracket {bracket}")]
    MissingRate {
        tier: String,
        bracket: String,
    },

    /// Breakdown lines could not be totalled
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl RatingError {
    /// Stable machine-readable code for callers that map errors to responses
    pub fn code(&self) -> &'static str {
        match self {
            RatingError::UnknownProduct(_) => "unknown_product",
            RatingError::InvalidCoverageTier { .. } => "invalid_coverage_tier",
            RatingError::InvalidAge { .. } => "invalid_age",
            RatingError::NoInsuredMembers => "no_insured_members",
            RatingError::UnknownFeatureId(_) => "unknown_feature_id",
            RatingError::UnknownRiderId(_) => "unknown_rider_id",
            RatingError::UnknownConditionId(_) => "unknown_condition_id",
            RatingError::UnknownRoomCategory(_) => "unknown_room_category",
            RatingError::InvalidTenure { .. } => "invalid_tenure",
            RatingError::InvalidSelection { .. } => "invalid_selection",
            RatingError::MissingRate { .. } => "missing_rate",
            RatingError::Money(_) => "money",
        }
    }

    pub(crate) fn selection(field: &'static str, detail: impl Into<String>) -> Self {
        RatingError::InvalidSelection {
            field,
            detail: detail.into(),
        }
    }
}
