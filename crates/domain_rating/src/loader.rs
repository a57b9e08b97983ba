//! Rate table document loading
//!
//! Rate tables arrive as one JSON document. Parsing and validation happen
//! together so a malformed table fails at startup (or at reload) instead of
//! producing a missing lookup in the middle of a request.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::TableError;
use crate::tables::{ProductRates, RateTables};

/// On-disk shape of the rate table configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateTableDocument {
    /// Free-form version label, echoed in logs
    #[serde(default)]
    pub version: Option<String>,
    pub products: Vec<ProductRates>,
}

impl TryFrom<RateTableDocument> for RateTables {
    type Error = TableError;

    fn try_from(document: RateTableDocument) -> Result<Self, Self::Error> {
        RateTables::new(document.version, document.products)
    }
}

impl RateTables {
    /// Parses and validates a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        let document: RateTableDocument = serde_json::from_str(json)?;
        document.try_into()
    }

    /// Parses and validates a JSON document from a reader
    pub fn from_reader(reader: impl Read) -> Result<Self, TableError> {
        let document: RateTableDocument = serde_json::from_reader(reader)?;
        document.try_into()
    }

    /// Reads, parses and validates a JSON document from disk
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tables = Self::from_reader(std::io::BufReader::new(file))?;

        tracing::info!(
            path = %path.display(),
            version = tables.version().unwrap_or("unversioned"),
            products = tables.len(),
            "Loaded rate tables"
        );
        Ok(tables)
    }
}
