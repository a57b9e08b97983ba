//! Pre-built Test Fixtures
//!
//! Provides ready-to-use rate tables, requests and identifiers. The rate
//! tables are parsed once from `fixtures/rate-tables.json` and shared by every
//! test in the process.
//!
//! # Fixture products
//!
//! - `family-health` (`FHLT`): sum aggregation, stepped chronic pricing,
//!   tenures 1-3 with 5% / 8% discounts. Age 40 at `5L` costs 8600.
//! - `senior-care` (`SNRC`): max aggregation, flat chronic pricing, a 20%
//!   default co-payment, one-year tenure only.

use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, PolicyHolderId, PolicyNumber, ProductCode, TransactionId};
use domain_issuance::{IdentifierGenerator, PolicyHolderRecord, ProductCodeRegistry};
use domain_rating::{CoverageSelection, MemberAge, ProductRates, RateTables, RatingRequest};

/// Raw JSON of the fixture rate tables
pub const RATE_TABLES_JSON: &str = include_str!("../fixtures/rate-tables.json");

static RATE_TABLES: Lazy<RateTables> = Lazy::new(|| {
    RateTables::from_json_str(RATE_TABLES_JSON).expect("fixture rate tables must be valid")
});

/// Fixture for rate tables
pub struct TableFixtures;

impl TableFixtures {
    pub const FAMILY_HEALTH: &'static str = "family-health";
    pub const SENIOR_CARE: &'static str = "senior-care";

    /// The shared, validated fixture tables
    pub fn tables() -> &'static RateTables {
        &RATE_TABLES
    }

    /// An owned copy, for tests that publish or mutate
    pub fn owned_tables() -> RateTables {
        RATE_TABLES.clone()
    }

    /// The `family-health` product, cloned so a test can edit it
    pub fn family_health() -> ProductRates {
        Self::product(Self::FAMILY_HEALTH)
    }

    /// The `senior-care` product, cloned so a test can edit it
    pub fn senior_care() -> ProductRates {
        Self::product(Self::SENIOR_CARE)
    }

    fn product(id: &str) -> ProductRates {
        RATE_TABLES
            .product(id)
            .cloned()
            .unwrap_or_else(|| panic!("fixture product {} missing", id))
    }

    /// Builds tables from products, panicking if they do not validate
    pub fn tables_of(products: Vec<ProductRates>) -> RateTables {
        RateTables::new(Some("test".to_string()), products).expect("test tables must be valid")
    }
}

/// Fixture for rating requests against the fixture tables
pub struct RequestFixtures;

impl RequestFixtures {
    /// `family-health`, tier `5L`, one member aged 40: priced at 8600
    pub fn single_adult_5l() -> RatingRequest {
        RatingRequest::new(
            TableFixtures::FAMILY_HEALTH,
            CoverageSelection::Tier("5L".to_string()),
            vec![MemberAge::Age(40)],
        )
    }

    /// [`Self::single_adult_5l`] plus the `critical-illness` rider (4032): priced at 12632
    pub fn single_adult_with_rider() -> RatingRequest {
        Self::single_adult_5l().with_rider("critical-illness")
    }

    /// Annual total of 10000 (8600 base + 1400 `restore-benefit`) over a two-year tenure
    pub fn two_year_tenure() -> RatingRequest {
        Self::single_adult_5l().with_feature("restore-benefit").with_tenure(2)
    }

    /// Two adults and a child on `family-health` `10L`
    pub fn family_of_three() -> RatingRequest {
        RatingRequest::new(
            TableFixtures::FAMILY_HEALTH,
            CoverageSelection::Tier("10L".to_string()),
            vec![MemberAge::Age(42), MemberAge::Age(38), MemberAge::Age(9)],
        )
    }

    /// Two seniors on `senior-care` `5L`, inheriting the 20% default co-payment
    pub fn senior_couple() -> RatingRequest {
        RatingRequest::new(
            TableFixtures::SENIOR_CARE,
            CoverageSelection::Tier("5L".to_string()),
            vec![MemberAge::Age(68), MemberAge::Age(79)],
        )
    }

    /// JSON payload of [`Self::single_adult_with_rider`]
    pub fn single_adult_with_rider_json() -> &'static str {
        r#"{
            "product_id": "family-health",
            "coverage": { "tier": "5L" },
            "members": [40],
            "riders": ["critical-illness"]
        }"#
    }
}

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn inr(units: i64) -> Money {
        Money::from_units(units, Currency::INR)
    }

    pub fn inr_zero() -> Money {
        Money::zero(Currency::INR)
    }

    /// Sum insured that resolves to the `5L` tier
    pub fn sum_insured_5l() -> Decimal {
        dec!(450000)
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    pub fn product_code() -> ProductCode {
        ProductCode::new("FHLT").expect("valid fixture code")
    }

    /// Registry built from the fixture tables' product codes
    pub fn registry() -> ProductCodeRegistry {
        ProductCodeRegistry::from_pairs(
            TableFixtures::tables()
                .product_codes()
                .map(|(id, code)| (id.to_string(), code.clone())),
        )
    }

    /// A seeded generator pinned to 2024 so runs are reproducible
    pub fn generator() -> IdentifierGenerator {
        IdentifierGenerator::new(Self::registry())
            .with_seed(42)
            .with_fixed_year(2024)
    }

    pub fn policy_number(serial: u16) -> PolicyNumber {
        PolicyNumber::new("BS", Self::product_code(), 2024, serial).expect("valid fixture policy number")
    }

    pub fn transaction_id(body: &str) -> TransactionId {
        TransactionId::from_body(body).expect("valid fixture transaction id")
    }

    /// A committed record holding `BS-FHLT-2024-<serial>` and `TXN-<body>`
    pub fn record(serial: u16, body: &str) -> PolicyHolderRecord {
        PolicyHolderRecord {
            id: PolicyHolderId::new(),
            product_id: TableFixtures::FAMILY_HEALTH.to_string(),
            policy_number: Self::policy_number(serial),
            transaction_id: Self::transaction_id(body),
            created_at: Utc
                .with_ymd_and_hms(2024, 4, 1, 9, 30, 0)
                .single()
                .expect("valid fixture timestamp"),
        }
    }
}
