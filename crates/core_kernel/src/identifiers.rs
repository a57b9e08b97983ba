//! Strongly-typed identifiers for domain entities
//!
//! Two families live here:
//! - Internal record ids: newtype wrappers around UUIDs, preventing accidental
//!   mixing of different identifier types.
//! - Human-readable business identifiers: policy numbers and transaction ids.
//!   Downstream systems parse these, so their formats are fixed:
//!
//! ```text
//! <PREFIX>-<PRODUCT_CODE>-<YEAR>-<4 digits>     BS-HLTH-2024-4821
//! TXN-<8 chars of A-Z 0-9>                      TXN-7QK2M9XA
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Prefix used for policy numbers unless a deployment overrides it
pub const DEFAULT_POLICY_PREFIX: &str = "BS";

/// Prefix of every transaction id
pub const TRANSACTION_PREFIX: &str = "TXN";

/// Number of characters after the `TXN-` prefix
pub const TRANSACTION_BODY_LEN: usize = 8;

/// Errors raised while parsing or constructing business identifiers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierFormatError {
    #[error("Invalid product code '{0}': expected exactly 4 uppercase letters")]
    ProductCode(String),

    #[error("Invalid policy number prefix '{0}': expected 1-8 uppercase letters")]
    Prefix(String),

    #[error("Invalid policy number '{0}'")]
    PolicyNumber(String),

    #[error("Invalid transaction id '{0}'")]
    TransactionId(String),
}

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(PolicyHolderId, "PH");

fn is_upper_alpha(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase())
}

fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// Fixed 4-letter code identifying a product line inside policy numbers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductCode(String);

impl ProductCode {
    /// Validates and wraps a product code
    pub fn new(code: impl Into<String>) -> Result<Self, IdentifierFormatError> {
        let code = code.into();
        if code.len() == 4 && is_upper_alpha(&code) {
            Ok(Self(code))
        } else {
            Err(IdentifierFormatError::ProductCode(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProductCode {
    type Error = IdentifierFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProductCode> for String {
    fn from(code: ProductCode) -> String {
        code.0
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validates a policy number prefix (1-8 uppercase letters)
pub fn validate_prefix(prefix: &str) -> Result<(), IdentifierFormatError> {
    if prefix.len() <= 8 && is_upper_alpha(prefix) {
        Ok(())
    } else {
        Err(IdentifierFormatError::Prefix(prefix.to_string()))
    }
}

/// Human-readable policy number, e.g. `BS-HLTH-2024-4821`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PolicyNumber {
    prefix: String,
    product_code: ProductCode,
    year: u16,
    serial: u16,
}

impl PolicyNumber {
    /// Assembles a policy number from its parts
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is malformed, or if the year or serial
    /// do not fit in four digits.
    pub fn new(
        prefix: &str,
        product_code: ProductCode,
        year: u16,
        serial: u16,
    ) -> Result<Self, IdentifierFormatError> {
        validate_prefix(prefix)?;
        if !(1000..=9999).contains(&year) || serial > 9999 {
            return Err(IdentifierFormatError::PolicyNumber(format!(
                "{}-{}-{}-{}",
                prefix, product_code, year, serial
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            product_code,
            year,
            serial,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn product_code(&self) -> &ProductCode {
        &self.product_code
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn serial(&self) -> u16 {
        self.serial
    }
}

impl fmt::Display for PolicyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:04}-{:04}",
            self.prefix, self.product_code, self.year, self.serial
        )
    }
}

impl FromStr for PolicyNumber {
    type Err = IdentifierFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IdentifierFormatError::PolicyNumber(s.to_string());
        let parts: Vec<&str> = s.split('-').collect();
        let [prefix, code, year, serial] = parts.as_slice() else {
            return Err(invalid());
        };
        if !is_digits(year, 4) || !is_digits(serial, 4) {
            return Err(invalid());
        }
        let product_code = ProductCode::new(*code).map_err(|_| invalid())?;
        let year: u16 = year.parse().map_err(|_| invalid())?;
        let serial: u16 = serial.parse().map_err(|_| invalid())?;
        PolicyNumber::new(prefix, product_code, year, serial).map_err(|_| invalid())
    }
}

impl TryFrom<String> for PolicyNumber {
    type Error = IdentifierFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PolicyNumber> for String {
    fn from(number: PolicyNumber) -> String {
        number.to_string()
    }
}

/// Payment transaction identifier, e.g. `TXN-7QK2M9XA`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    /// Wraps the 8-character body of a transaction id
    pub fn from_body(body: &str) -> Result<Self, IdentifierFormatError> {
        let valid = body.len() == TRANSACTION_BODY_LEN
            && body
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if valid {
            Ok(Self(body.to_string()))
        } else {
            Err(IdentifierFormatError::TransactionId(format!(
                "{}-{}",
                TRANSACTION_PREFIX, body
            )))
        }
    }

    /// Returns the part after `TXN-`
    pub fn body(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", TRANSACTION_PREFIX, self.0)
    }
}

impl FromStr for TransactionId {
    type Err = IdentifierFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(TRANSACTION_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or_else(|| IdentifierFormatError::TransactionId(s.to_string()))?;
        Self::from_body(body).map_err(|_| IdentifierFormatError::TransactionId(s.to_string()))
    }
}

impl TryFrom<String> for TransactionId {
    type Error = IdentifierFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> String {
        id.to_string()
    }
}
