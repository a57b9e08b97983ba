//! Issuance ports
//!
//! The generator never talks to a database directly. It asks an
//! [`ExistenceCheck`] whether a candidate is taken, and the registration write
//! path commits through a [`PolicyHolderStore`] whose insert enforces
//! uniqueness. The pre-check is optimistic: two concurrent registrations can
//! both see a candidate as free, and only the store's constraint decides which
//! one wins.
//!
//! # Adapters
//!
//! - **Closures**: any `Fn(&str) -> bool` is an existence check, handy for
//!   tests and for checking against an in-memory set
//! - **Store-backed**: [`PolicyNumberCheck`] and [`TransactionIdCheck`] view a
//!   store as a check for one identifier family
//! - **Mock**: [`mock::MockPolicyHolderStore`] for tests, with conflict and
//!   failure injection

use async_trait::async_trait;

use core_kernel::{DomainPort, PolicyHolderId, PortError};

use crate::registration::PolicyHolderRecord;

/// Answers "is this identifier already in use?"
#[async_trait]
pub trait ExistenceCheck: Send + Sync {
    /// Returns `Ok(true)` if `candidate` is taken
    async fn exists(&self, candidate: &str) -> Result<bool, PortError>;
}

#[async_trait]
impl<F> ExistenceCheck for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    async fn exists(&self, candidate: &str) -> Result<bool, PortError> {
        Ok(self(candidate))
    }
}

/// Persistence port for policy-holder records
///
/// Implementations must reject an insert whose policy number or transaction
/// id is already stored with [`PortError::Conflict`].
#[async_trait]
pub trait PolicyHolderStore: DomainPort {
    async fn policy_number_exists(&self, policy_number: &str) -> Result<bool, PortError>;

    async fn transaction_id_exists(&self, transaction_id: &str) -> Result<bool, PortError>;

    /// Commits a new record, enforcing identifier uniqueness
    async fn insert(&self, record: PolicyHolderRecord) -> Result<(), PortError>;

    async fn get(&self, id: PolicyHolderId) -> Result<PolicyHolderRecord, PortError>;
}

/// A store viewed as an existence check for policy numbers
pub struct PolicyNumberCheck<'a, S: ?Sized>(pub &'a S);

#[async_trait]
impl<S: PolicyHolderStore + ?Sized> ExistenceCheck for PolicyNumberCheck<'_, S> {
    async fn exists(&self, candidate: &str) -> Result<bool, PortError> {
        self.0.policy_number_exists(candidate).await
    }
}

/// A store viewed as an existence check for transaction ids
pub struct TransactionIdCheck<'a, S: ?Sized>(pub &'a S);

#[async_trait]
impl<S: PolicyHolderStore + ?Sized> ExistenceCheck for TransactionIdCheck<'_, S> {
    async fn exists(&self, candidate: &str) -> Result<bool, PortError> {
        self.0.transaction_id_exists(candidate).await
    }
}

/// Mock implementation of PolicyHolderStore for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::sync::RwLock;

    /// In-memory policy-holder store with a uniqueness constraint
    #[derive(Debug, Default)]
    pub struct MockPolicyHolderStore {
        records: RwLock<HashMap<PolicyHolderId, PolicyHolderRecord>>,
        /// Inserts still to be rejected as if a concurrent writer won
        forced_conflicts: AtomicU32,
        /// Errors returned by the next existence checks, in order
        check_failures: Mutex<VecDeque<PortError>>,
        checks: AtomicU32,
        inserts: AtomicU32,
    }

    impl MockPolicyHolderStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with records for testing
        pub async fn with_records(records: Vec<PolicyHolderRecord>) -> Self {
            let store = Self::new();
            {
                let mut map = store.records.write().await;
                for record in records {
                    map.insert(record.id, record);
                }
            }
            store
        }

        /// Rejects the next `count` inserts with a conflict
        pub fn force_conflicts(&self, count: u32) {
            self.forced_conflicts.store(count, Ordering::SeqCst);
        }

        /// Fails the next existence checks with the given errors
        pub fn fail_next_checks(&self, errors: Vec<PortError>) {
            let mut queue = self.check_failures.lock().unwrap_or_else(|e| e.into_inner());
            queue.extend(errors);
        }

        /// Existence checks served so far
        pub fn check_calls(&self) -> u32 {
            self.checks.load(Ordering::SeqCst)
        }

        /// Insert attempts received so far, rejected ones included
        pub fn insert_calls(&self) -> u32 {
            self.inserts.load(Ordering::SeqCst)
        }

        pub async fn len(&self) -> usize {
            self.records.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.records.read().await.is_empty()
        }

        fn next_check_failure(&self) -> Option<PortError> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            self.check_failures
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front()
        }

        fn take_forced_conflict(&self) -> bool {
            self.forced_conflicts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    impl DomainPort for MockPolicyHolderStore {}

    #[async_trait]
    impl PolicyHolderStore for MockPolicyHolderStore {
        async fn policy_number_exists(&self, policy_number: &str) -> Result<bool, PortError> {
            if let Some(err) = self.next_check_failure() {
                return Err(err);
            }
            Ok(self
                .records
                .read()
                .await
                .values()
                .any(|r| r.policy_number.to_string() == policy_number))
        }

        async fn transaction_id_exists(&self, transaction_id: &str) -> Result<bool, PortError> {
            if let Some(err) = self.next_check_failure() {
                return Err(err);
            }
            Ok(self
                .records
                .read()
                .await
                .values()
                .any(|r| r.transaction_id.to_string() == transaction_id))
        }

        async fn insert(&self, record: PolicyHolderRecord) -> Result<(), PortError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            if self.take_forced_conflict() {
                return Err(PortError::conflict(format!(
                    "policy number {} was committed by a concurrent registration",
                    record.policy_number
                )));
            }

            let mut records = self.records.write().await;
            if let Some(existing) = records.values().find(|r| {
                r.policy_number == record.policy_number || r.transaction_id == record.transaction_id
            }) {
                return Err(PortError::conflict(format!(
                    "identifiers of {} collide with record {}",
                    record.policy_number, existing.id
                )));
            }
            if records.contains_key(&record.id) {
                return Err(PortError::conflict(format!("record {} already exists", record.id)));
            }
            records.insert(record.id, record);
            Ok(())
        }

        async fn get(&self, id: PolicyHolderId) -> Result<PolicyHolderRecord, PortError> {
            self.records
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("PolicyHolder", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockPolicyHolderStore;
    use super::*;
    use chrono::Utc;
    use core_kernel::{PolicyNumber, ProductCode, TransactionId};

    fn record(serial: u16, txn: &str) -> PolicyHolderRecord {
        PolicyHolderRecord {
            id: PolicyHolderId::new(),
            product_id: "family-health".to_string(),
            policy_number: PolicyNumber::new("BS", ProductCode::new("FHLT").unwrap(), 2024, serial).unwrap(),
            transaction_id: TransactionId::from_body(txn).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_closure_is_an_existence_check() {
        let taken = ["BS-FHLT-2024-1234"];
        let check = |candidate: &str| taken.iter().any(|t| *t == candidate);

        assert!(check.exists("BS-FHLT-2024-1234").await.unwrap());
        assert!(!check.exists("BS-FHLT-2024-4321").await.unwrap());
    }

    #[tokio::test]
    async fn test_mock_store_rejects_duplicate_identifiers() {
        let store = MockPolicyHolderStore::new();
        store.insert(record(1234, "AAAA1111")).await.unwrap();

        let same_number = store.insert(record(1234, "BBBB2222")).await.unwrap_err();
        let same_txn = store.insert(record(5678, "AAAA1111")).await.unwrap_err();

        assert!(same_number.is_conflict());
        assert!(same_txn.is_conflict());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_backed_checks() {
        let store = MockPolicyHolderStore::with_records(vec![record(1234, "AAAA1111")]).await;

        assert!(PolicyNumberCheck(&store).exists("BS-FHLT-2024-1234").await.unwrap());
        assert!(!PolicyNumberCheck(&store).exists("BS-FHLT-2024-9999").await.unwrap());
        assert!(TransactionIdCheck(&store).exists("TXN-AAAA1111").await.unwrap());
        assert_eq!(store.check_calls(), 3);
    }

    #[tokio::test]
    async fn test_forced_conflicts_are_consumed() {
        let store = MockPolicyHolderStore::new();
        store.force_conflicts(1);

        assert!(store.insert(record(1000, "CCCC3333")).await.unwrap_err().is_conflict());
        store.insert(record(1000, "CCCC3333")).await.unwrap();
        assert_eq!(store.insert_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_get_not_found() {
        let store = MockPolicyHolderStore::new();
        let err = store.get(PolicyHolderId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
