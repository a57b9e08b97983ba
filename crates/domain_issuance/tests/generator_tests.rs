//! Identifier Generation Tests
//!
//! Exercises minting against closures, slow checks and the mock store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use core_kernel::PortError;
use domain_issuance::ports::mock::MockPolicyHolderStore;
use domain_issuance::{
    ExistenceCheck, IdentifierError, IdentifierKind, IdentifierRequest, PolicyHolderStore, PolicyNumberCheck,
    RegistrationError, RegistrationService, TransactionIdCheck, SERIAL_RANGE,
};
use test_utils::{assert_policy_number_format, assert_transaction_id_format, IdFixtures, TableFixtures};

/// Rejects the first `reject` candidates, recording every candidate seen
struct RejectFirst {
    reject: u32,
    seen: Mutex<Vec<String>>,
}

impl RejectFirst {
    fn new(reject: u32) -> Self {
        Self {
            reject,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ExistenceCheck for RejectFirst {
    async fn exists(&self, candidate: &str) -> Result<bool, PortError> {
        let mut seen = self.seen.lock().unwrap();
        seen.push(candidate.to_string());
        Ok(seen.len() as u32 <= self.reject)
    }
}

/// Answers only after `delay`
struct SlowCheck {
    delay: Duration,
    calls: AtomicU32,
}

#[async_trait]
impl ExistenceCheck for SlowCheck {
    async fn exists(&self, _candidate: &str) -> Result<bool, PortError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(false)
    }
}

mod format_tests {
    use super::*;

    #[tokio::test]
    async fn test_policy_numbers_use_product_code_and_year() {
        let never_taken = |_: &str| false;
        let generator = IdFixtures::generator();

        let family = generator
            .policy_number(TableFixtures::FAMILY_HEALTH, &never_taken)
            .await
            .unwrap();
        let senior = generator
            .policy_number(TableFixtures::SENIOR_CARE, &never_taken)
            .await
            .unwrap();

        assert_policy_number_format(&family.to_string());
        assert_policy_number_format(&senior.to_string());
        assert_eq!(family.product_code().as_str(), "FHLT");
        assert_eq!(senior.product_code().as_str(), "SNRC");
        assert_eq!(family.year(), 2024);
        assert!(SERIAL_RANGE.contains(&family.serial()));
    }

    #[tokio::test]
    async fn test_transaction_ids_are_well_formed() {
        let never_taken = |_: &str| false;
        let generator = IdFixtures::generator();

        for _ in 0..50 {
            let id = generator.transaction_id(&never_taken).await.unwrap();
            assert_transaction_id_format(&id.to_string());
        }
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let never_taken = |_: &str| false;
        let generator = IdFixtures::generator().with_prefix("HX").unwrap();

        let number = generator
            .policy_number(TableFixtures::FAMILY_HEALTH, &never_taken)
            .await
            .unwrap();
        assert!(number.to_string().starts_with("HX-FHLT-2024-"));
    }
}

mod retry_tests {
    use super::*;

    /// Verifies that rejecting N candidates costs exactly N + 1 checks
    #[tokio::test]
    async fn test_taken_candidates_are_retried() {
        let check = RejectFirst::new(4);
        let number = IdFixtures::generator()
            .policy_number(TableFixtures::FAMILY_HEALTH, &check)
            .await
            .unwrap();

        assert_eq!(check.calls(), 5);
        let seen = check.seen.lock().unwrap();
        assert_eq!(seen.last().unwrap(), &number.to_string());
    }

    #[tokio::test]
    async fn test_budget_exhausted_when_every_candidate_is_taken() {
        let check = RejectFirst::new(u32::MAX);
        let generator = IdFixtures::generator().with_max_attempts(6);

        let err = generator.transaction_id(&check).await.unwrap_err();

        assert!(matches!(
            err,
            IdentifierError::Exhausted {
                kind: IdentifierKind::TransactionId,
                attempts: 6
            }
        ));
        assert!(err.is_retryable());
        assert_eq!(check.calls(), 6);
    }

    #[tokio::test]
    async fn test_rejections_equal_to_budget_exhaust() {
        let check = RejectFirst::new(3);
        let request = IdentifierRequest::new(TableFixtures::FAMILY_HEALTH).with_max_attempts(3);

        let err = IdFixtures::generator().generate(&request, &check).await.unwrap_err();
        assert_eq!(err.code(), "identifier_exhausted");
    }

    #[tokio::test]
    async fn test_zero_budget_is_exhausted_without_checks() {
        let check = RejectFirst::new(0);
        let request = IdentifierRequest::new(TableFixtures::FAMILY_HEALTH).with_max_attempts(0);

        let err = IdFixtures::generator().generate(&request, &check).await.unwrap_err();

        assert!(matches!(
            err,
            IdentifierError::Exhausted {
                kind: IdentifierKind::PolicyNumber,
                attempts: 0
            }
        ));
        assert_eq!(check.calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_default_budget_is_exhausted() {
        let check = RejectFirst::new(0);
        let err = IdFixtures::generator()
            .with_max_attempts(0)
            .transaction_id(&check)
            .await
            .unwrap_err();

        assert!(matches!(err, IdentifierError::Exhausted { attempts: 0, .. }));
        assert_eq!(check.calls(), 0);
    }

    #[tokio::test]
    async fn test_issued_set_is_avoided() {
        let issued: HashSet<String> = (1000..=9998).map(|s| format!("BS-FHLT-2024-{s}")).collect();
        let check = |candidate: &str| issued.contains(candidate);
        let generator = IdFixtures::generator().with_max_attempts(100_000);

        let number = generator
            .policy_number(TableFixtures::FAMILY_HEALTH, &check)
            .await
            .unwrap();
        assert_eq!(number.serial(), 9999);
    }
}

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_timed_out_check_counts_as_failed_attempt() {
        let check = SlowCheck {
            delay: Duration::from_millis(250),
            calls: AtomicU32::new(0),
        };
        let generator = IdFixtures::generator()
            .with_max_attempts(2)
            .with_check_timeout(Duration::from_millis(20));

        let err = generator.transaction_id(&check).await.unwrap_err();

        assert!(matches!(err, IdentifierError::Exhausted { attempts: 2, .. }));
        assert_eq!(check.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transient_store_errors_are_retried() {
        let store = MockPolicyHolderStore::new();
        store.fail_next_checks(vec![
            PortError::connection("connection reset"),
            PortError::timeout("policy_number_exists", 2000),
        ]);

        let number = IdFixtures::generator()
            .policy_number(TableFixtures::FAMILY_HEALTH, &PolicyNumberCheck(&store))
            .await
            .unwrap();

        assert_policy_number_format(&number.to_string());
        assert_eq!(store.check_calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_store_error_stops_minting() {
        let store = MockPolicyHolderStore::new();
        store.fail_next_checks(vec![PortError::internal("constraint catalog missing")]);

        let err = IdFixtures::generator()
            .transaction_id(&TransactionIdCheck(&store))
            .await
            .unwrap_err();

        assert!(matches!(err, IdentifierError::Store(_)));
        assert!(!err.is_retryable());
        assert_eq!(store.check_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_product_rejected_without_checks() {
        let store = MockPolicyHolderStore::new();

        let err = IdFixtures::generator()
            .policy_number("dental", &PolicyNumberCheck(&store))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "invalid_product_code");
        assert_eq!(store.check_calls(), 0);
    }
}

mod registration_tests {
    use super::*;

    fn service(store: Arc<MockPolicyHolderStore>) -> RegistrationService<MockPolicyHolderStore> {
        RegistrationService::new(store, Arc::new(IdFixtures::generator()))
    }

    #[tokio::test]
    async fn test_registrations_never_share_identifiers() {
        let store = Arc::new(MockPolicyHolderStore::new());
        let service = service(store.clone());

        let mut numbers = HashSet::new();
        let mut transactions = HashSet::new();
        for _ in 0..25 {
            let record = service.register(TableFixtures::FAMILY_HEALTH).await.unwrap();
            assert!(numbers.insert(record.policy_number.to_string()));
            assert!(transactions.insert(record.transaction_id.to_string()));
        }
        assert_eq!(store.len().await, 25);
    }

    /// A concurrent writer wins the first commit; the retry mints fresh identifiers
    #[tokio::test]
    async fn test_lost_race_is_retried_with_new_identifiers() {
        let existing = IdFixtures::record(1234, "AAAA1111");
        let store = Arc::new(MockPolicyHolderStore::with_records(vec![existing.clone()]).await);
        store.force_conflicts(1);

        let record = service(store.clone())
            .register(TableFixtures::FAMILY_HEALTH)
            .await
            .unwrap();

        assert_eq!(store.insert_calls(), 2);
        assert_eq!(store.len().await, 2);
        assert_ne!(record.policy_number, existing.policy_number);
        assert_eq!(store.get(existing.id).await.unwrap(), existing);
    }

    #[tokio::test]
    async fn test_unmapped_product_is_not_registered() {
        let store = Arc::new(MockPolicyHolderStore::new());

        let err = service(store.clone()).register("dental").await.unwrap_err();

        assert!(matches!(
            err,
            RegistrationError::Identifier(IdentifierError::InvalidProductCode(_))
        ));
        assert!(!err.is_retryable());
        assert_eq!(store.insert_calls(), 0);
    }

    #[test]
    fn test_record_serializes_identifiers_as_strings() {
        let record = IdFixtures::record(4821, "7QK2M9XA");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["policy_number"], "BS-FHLT-2024-4821");
        assert_eq!(json["transaction_id"], "TXN-7QK2M9XA");
        assert_eq!(json["product_id"], "family-health");
    }
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Any seed yields well-formed candidates
        #[test]
        fn prop_candidates_are_well_formed(seed in any::<u64>()) {
            let generator = IdFixtures::generator().with_seed(seed);

            let number = generator.candidate_policy_number(TableFixtures::FAMILY_HEALTH).unwrap();
            let id = generator.candidate_transaction_id().unwrap();

            assert_policy_number_format(&number.to_string());
            assert_transaction_id_format(&id.to_string());
            prop_assert!(SERIAL_RANGE.contains(&number.serial()));
        }
    }
}
