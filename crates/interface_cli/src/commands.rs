//! Command implementations
//!
//! Each command is a plain function returning a typed value so the binary only
//! parses arguments and prints, and tests can drive commands directly.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use core_kernel::{PolicyNumber, TransactionId};
use domain_issuance::{IdentifierGenerator, IdentifierRequest, ProductCodeRegistry};
use domain_rating::{RateTableStore, RateTables, RatingRequest, RatingResult, RatingService};

use crate::config::RaterConfig;
use crate::error::CliError;

/// Summary printed by `validate-tables`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablesSummary {
    pub version: Option<String>,
    pub products: Vec<ProductSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSummary {
    pub product_id: String,
    pub product_code: String,
    pub currency: String,
    pub coverage_tiers: usize,
    pub age_brackets: usize,
    pub features: usize,
    pub riders: usize,
    pub chronic_conditions: usize,
    pub tenure: (u32, u32),
}

impl From<&RateTables> for TablesSummary {
    fn from(tables: &RateTables) -> Self {
        Self {
            version: tables.version().map(str::to_string),
            products: tables
                .products()
                .map(|p| ProductSummary {
                    product_id: p.product_id.clone(),
                    product_code: p.product_code.to_string(),
                    currency: p.currency.code().to_string(),
                    coverage_tiers: p.coverage_tiers.len(),
                    age_brackets: p.age_brackets.len(),
                    features: p.features.len(),
                    riders: p.riders.len(),
                    chronic_conditions: p.chronic_conditions.as_ref().map_or(0, |c| c.conditions.len()),
                    tenure: (p.tenure.min_years, p.tenure.max_years),
                })
                .collect(),
        }
    }
}

/// Loads and validates a rate table document
pub fn validate_tables(path: &Path) -> Result<TablesSummary, CliError> {
    let tables = RateTables::load_from_path(path)?;
    Ok(TablesSummary::from(&tables))
}

/// Reads a JSON rating request and prices it
pub fn rate_request(tables_path: &Path, request_path: &Path) -> Result<RatingResult, CliError> {
    let raw = std::fs::read_to_string(request_path).map_err(|source| CliError::Io {
        path: request_path.to_path_buf(),
        source,
    })?;
    let request: RatingRequest = serde_json::from_str(&raw).map_err(|source| CliError::Request {
        path: request_path.to_path_buf(),
        source,
    })?;

    let service = RatingService::new(Arc::new(RateTableStore::open(tables_path)?));
    Ok(service.quote(&request)?)
}

/// Reads identifiers already in use, one per line
///
/// Blank lines and lines starting with `#` are skipped. A missing `path`
/// means nothing is in use.
pub fn load_existing(path: Option<&Path>) -> Result<HashSet<String>, CliError> {
    let Some(path) = path else {
        return Ok(HashSet::new());
    };
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Builds a generator from configuration and the products in `tables`
pub fn build_generator(
    config: &RaterConfig,
    tables: &RateTables,
    year: Option<u16>,
) -> Result<IdentifierGenerator, CliError> {
    let registry = ProductCodeRegistry::from_pairs(
        tables
            .product_codes()
            .map(|(id, code)| (id.to_string(), code.clone())),
    );
    let generator = IdentifierGenerator::new(registry)
        .with_prefix(config.policy_prefix.as_str())?
        .with_max_attempts(config.max_attempts)
        .with_check_timeout(config.check_timeout());
    Ok(match year {
        Some(year) => generator.with_fixed_year(year),
        None => generator,
    })
}

/// Mints a policy number not present in `existing`
pub async fn mint_policy_number(
    config: &RaterConfig,
    tables_path: &Path,
    product_id: &str,
    existing: Option<&Path>,
    year: Option<u16>,
) -> Result<PolicyNumber, CliError> {
    let tables = RateTables::load_from_path(tables_path)?;
    let generator = build_generator(config, &tables, year)?;
    let taken = load_existing(existing)?;
    let check = |candidate: &str| taken.contains(candidate);

    Ok(generator.generate(&IdentifierRequest::new(product_id), &check).await?)
}

/// Mints a transaction id not present in `existing`
pub async fn mint_transaction_id(config: &RaterConfig, existing: Option<&Path>) -> Result<TransactionId, CliError> {
    let generator = IdentifierGenerator::new(ProductCodeRegistry::new())
        .with_max_attempts(config.max_attempts)
        .with_check_timeout(config.check_timeout());
    let taken = load_existing(existing)?;
    let check = |candidate: &str| taken.contains(candidate);

    Ok(generator.transaction_id(&check).await?)
}
