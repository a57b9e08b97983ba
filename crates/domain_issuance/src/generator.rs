//! Identifier generation
//!
//! Candidates are random, so uniqueness is established by asking an
//! [`ExistenceCheck`] and retrying on a hit. Each attempt has its own timeout;
//! a slow or briefly unavailable store costs one attempt from the budget
//! instead of failing the registration outright.
//!
//! ```text
//!   candidate ─▶ exists? ── false ─────────▶ Ok(candidate)
//!                   │
//!                   ├── true / timeout / transient ─▶ next attempt
//!                   │                                 (Exhausted when budget spent)
//!                   └── other store error ──────────▶ Err(Store)
//! ```

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{Datelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use core_kernel::identifiers::{validate_prefix, TRANSACTION_BODY_LEN};
use core_kernel::{PolicyNumber, ProductCode, TransactionId, DEFAULT_POLICY_PREFIX};

use crate::error::{IdentifierError, IdentifierKind};
use crate::ports::ExistenceCheck;

/// Attempts per identifier unless configured otherwise
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Time allowed for one existence check
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Inclusive range of the random serial in a policy number
pub const SERIAL_RANGE: std::ops::RangeInclusive<u16> = 1000..=9999;

const TRANSACTION_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Product id to policy-number code mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductCodeRegistry {
    codes: HashMap<String, ProductCode>,
}

impl ProductCodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from `(product_id, code)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, ProductCode)>,
        S: Into<String>,
    {
        Self {
            codes: pairs.into_iter().map(|(id, code)| (id.into(), code)).collect(),
        }
    }

    pub fn register(mut self, product_id: impl Into<String>, code: ProductCode) -> Self {
        self.codes.insert(product_id.into(), code);
        self
    }

    pub fn code_for(&self, product_id: &str) -> Option<&ProductCode> {
        self.codes.get(product_id)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// A policy-number request; `max_attempts` overrides the generator default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierRequest {
    pub product_id: String,
    pub max_attempts: Option<u32>,
}

impl IdentifierRequest {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// Mints policy numbers and transaction ids
#[derive(Debug)]
pub struct IdentifierGenerator {
    registry: ProductCodeRegistry,
    prefix: String,
    max_attempts: u32,
    check_timeout: Duration,
    fixed_year: Option<u16>,
    rng: Mutex<StdRng>,
}

impl IdentifierGenerator {
    /// Creates a generator with the default prefix, budget and timeout
    pub fn new(registry: ProductCodeRegistry) -> Self {
        Self {
            registry,
            prefix: DEFAULT_POLICY_PREFIX.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
            fixed_year: None,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Overrides the policy-number prefix
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Format`] unless the prefix is 1-8 uppercase letters.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Result<Self, IdentifierError> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        self.prefix = prefix;
        Ok(self)
    }

    /// Sets the default attempt budget; a budget of zero makes no attempt
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    /// Makes candidate generation reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Pins the year written into policy numbers instead of the current UTC year
    pub fn with_fixed_year(mut self, year: u16) -> Self {
        self.fixed_year = Some(year);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn check_timeout(&self) -> Duration {
        self.check_timeout
    }

    pub fn registry(&self) -> &ProductCodeRegistry {
        &self.registry
    }

    fn issue_year(&self) -> u16 {
        self.fixed_year
            .unwrap_or_else(|| Utc::now().year().clamp(1000, 9999) as u16)
    }

    /// Builds one policy-number candidate without checking uniqueness
    pub fn candidate_policy_number(&self, product_id: &str) -> Result<PolicyNumber, IdentifierError> {
        let code = self
            .registry
            .code_for(product_id)
            .ok_or_else(|| IdentifierError::InvalidProductCode(product_id.to_string()))?;
        let serial = self.rng().gen_range(SERIAL_RANGE);
        Ok(PolicyNumber::new(&self.prefix, code.clone(), self.issue_year(), serial)?)
    }

    /// Builds one transaction-id candidate without checking uniqueness
    pub fn candidate_transaction_id(&self) -> Result<TransactionId, IdentifierError> {
        let body: String = {
            let mut rng = self.rng();
            (0..TRANSACTION_BODY_LEN)
                .map(|_| TRANSACTION_ALPHABET[rng.gen_range(0..TRANSACTION_ALPHABET.len())] as char)
                .collect()
        };
        Ok(TransactionId::from_body(&body)?)
    }

    /// Mints a policy number for `product_id` with the default budget
    pub async fn policy_number<C>(&self, product_id: &str, check: &C) -> Result<PolicyNumber, IdentifierError>
    where
        C: ExistenceCheck + ?Sized,
    {
        self.generate(&IdentifierRequest::new(product_id), check).await
    }

    /// Mints a policy number for an [`IdentifierRequest`]
    ///
    /// # Errors
    ///
    /// - [`IdentifierError::InvalidProductCode`] if the product has no code;
    ///   no check is made in that case
    /// - [`IdentifierError::Exhausted`] once the attempt budget is spent
    /// - [`IdentifierError::Store`] on a non-transient existence-check failure
    #[tracing::instrument(
        name = "issuance.policy_number",
        skip(self, request, check),
        fields(product = %request.product_id)
    )]
    pub async fn generate<C>(&self, request: &IdentifierRequest, check: &C) -> Result<PolicyNumber, IdentifierError>
    where
        C: ExistenceCheck + ?Sized,
    {
        // Fail before touching the store if the product is unmapped
        if self.registry.code_for(&request.product_id).is_none() {
            return Err(IdentifierError::InvalidProductCode(request.product_id.clone()));
        }

        let attempts = request.max_attempts.unwrap_or(self.max_attempts);
        mint_unique(IdentifierKind::PolicyNumber, attempts, self.check_timeout, check, || {
            self.candidate_policy_number(&request.product_id)
        })
        .await
    }

    /// Mints a transaction id with the default budget
    #[tracing::instrument(name = "issuance.transaction_id", skip(self, check))]
    pub async fn transaction_id<C>(&self, check: &C) -> Result<TransactionId, IdentifierError>
    where
        C: ExistenceCheck + ?Sized,
    {
        mint_unique(
            IdentifierKind::TransactionId,
            self.max_attempts,
            self.check_timeout,
            check,
            || self.candidate_transaction_id(),
        )
        .await
    }

    fn rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
        // An RNG cannot be left in a broken state by a panicking holder
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Retries `candidate` until `check` reports it free
///
/// A taken candidate, a timed-out check, and a transient store error each use
/// up one attempt. Any other store error ends the loop.
///
/// A budget of zero returns [`IdentifierError::Exhausted`] without calling `check`.
pub async fn mint_unique<T, C, G>(
    kind: IdentifierKind,
    max_attempts: u32,
    timeout: Duration,
    check: &C,
    mut candidate: G,
) -> Result<T, IdentifierError>
where
    T: Display,
    C: ExistenceCheck + ?Sized,
    G: FnMut() -> Result<T, IdentifierError>,
{
    for attempt in 1..=max_attempts {
        let value = candidate()?;
        let rendered = value.to_string();

        match tokio::time::timeout(timeout, check.exists(&rendered)).await {
            Ok(Ok(false)) => {
                tracing::debug!(%kind, attempt, identifier = %rendered, "Minted unique identifier");
                return Ok(value);
            }
            Ok(Ok(true)) => {
                tracing::debug!(%kind, attempt, candidate = %rendered, "Candidate already in use");
            }
            Ok(Err(err)) if err.is_transient() => {
                tracing::warn!(%kind, attempt, error = %err, "Existence check failed; counting as a failed attempt");
            }
            Ok(Err(err)) => return Err(IdentifierError::Store(err)),
            Err(_) => {
                tracing::warn!(
                    %kind,
                    attempt,
                    timeout_ms = timeout.as_millis() as u64,
                    "Existence check timed out; counting as a failed attempt"
                );
            }
        }
    }

    tracing::warn!(%kind, attempts = max_attempts, "Identifier attempt budget exhausted");
    Err(IdentifierError::Exhausted {
        kind,
        attempts: max_attempts,
    })
}
