//! Policy-holder registration write path
//!
//! Identifiers are minted exactly once, when a policy-holder record is
//! created, and are never regenerated for an existing record. The generator's
//! existence check narrows the odds of a collision; the store's uniqueness
//! constraint closes the race. A conflict on insert sends the registration
//! back to minting fresh identifiers, up to `max_commit_attempts` times.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{PolicyHolderId, PolicyNumber, TransactionId};

use crate::error::RegistrationError;
use crate::generator::IdentifierGenerator;
use crate::ports::{PolicyHolderStore, PolicyNumberCheck, TransactionIdCheck};

/// Commit attempts unless configured otherwise
pub const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 3;

/// A committed policy holder with its business identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyHolderRecord {
    pub id: PolicyHolderId,
    pub product_id: String,
    pub policy_number: PolicyNumber,
    pub transaction_id: TransactionId,
    pub created_at: DateTime<Utc>,
}

/// Creates policy-holder records with collision-free identifiers
pub struct RegistrationService<S: PolicyHolderStore + ?Sized> {
    store: Arc<S>,
    generator: Arc<IdentifierGenerator>,
    max_commit_attempts: u32,
}

impl<S: PolicyHolderStore + ?Sized> RegistrationService<S> {
    pub fn new(store: Arc<S>, generator: Arc<IdentifierGenerator>) -> Self {
        Self {
            store,
            generator,
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
        }
    }

    /// Sets how many insert conflicts are absorbed before giving up
    pub fn with_max_commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    pub fn max_commit_attempts(&self) -> u32 {
        self.max_commit_attempts
    }

    /// Mints identifiers for a new policy holder and commits the record
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::Identifier`] if minting fails (unmapped product,
    ///   exhausted budget, store error during the pre-check)
    /// - [`RegistrationError::Exhausted`] if every commit lost a uniqueness race
    /// - [`RegistrationError::Store`] on any other insert failure
    #[tracing::instrument(name = "issuance.register", skip(self))]
    pub async fn register(&self, product_id: &str) -> Result<PolicyHolderRecord, RegistrationError> {
        let store = self.store.as_ref();

        for attempt in 1..=self.max_commit_attempts {
            let policy_number = self
                .generator
                .policy_number(product_id, &PolicyNumberCheck(store))
                .await?;
            let transaction_id = self.generator.transaction_id(&TransactionIdCheck(store)).await?;

            let record = PolicyHolderRecord {
                id: PolicyHolderId::new_v7(),
                product_id: product_id.to_string(),
                policy_number,
                transaction_id,
                created_at: Utc::now(),
            };

            match store.insert(record.clone()).await {
                Ok(()) => {
                    tracing::info!(
                        id = %record.id,
                        policy_number = %record.policy_number,
                        transaction_id = %record.transaction_id,
                        attempt,
                        "Registered policy holder"
                    );
                    return Ok(record);
                }
                Err(err) if err.is_conflict() => {
                    tracing::warn!(attempt, error = %err, "Identifier collision at commit; minting again");
                }
                Err(err) => return Err(RegistrationError::Store(err)),
            }
        }

        Err(RegistrationError::Exhausted {
            attempts: self.max_commit_attempts,
        })
    }
}
