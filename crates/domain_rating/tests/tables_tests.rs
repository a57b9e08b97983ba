//! Rate Table Validation Tests
//!
//! Load-time validation must reject every structurally broken table before a
//! request can see it.
//!
//! # Test Organization
//!
//! - `loading_tests` - Document parsing, defaults and reload behavior
//! - `validation_tests` - Structural rules on a single product
//! - `catalog_tests` - Cross-product rules

use domain_rating::{
    AgeBracket, ChronicPricing, CoPayment, RateTableStore, RateTables, TableError, TenureRules,
};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use test_utils::{ProductRatesBuilder, TableFixtures, RATE_TABLES_JSON};

fn validate(builder: ProductRatesBuilder) -> Result<RateTables, TableError> {
    RateTables::new(None, vec![builder.build()])
}

// ============================================================================
// LOADING TESTS
// ============================================================================

mod loading_tests {
    use super::*;

    /// Verifies the fixture document loads with both products
    #[test]
    fn test_fixture_document_loads() {
        let tables = RateTables::from_json_str(RATE_TABLES_JSON).unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables.version(), Some("2024-04-fixture"));
        let codes: Vec<_> = tables.product_codes().map(|(id, code)| (id, code.as_str())).collect();
        assert_eq!(codes, vec![("family-health", "FHLT"), ("senior-care", "SNRC")]);
    }

    /// Verifies omitted optional sections take their defaults
    #[test]
    fn test_defaults() {
        let senior = TableFixtures::senior_care();

        assert!(senior.features.is_empty());
        assert_eq!(senior.room_rent.default_daily_cap, None);
        assert_eq!(senior.room_rent.cap_excess_rate, dec!(0.03));
        assert_eq!(senior.waiting_period_unit_rate, dec!(0));
        assert!(senior.tenure.discounts.is_empty());
    }

    /// Verifies a reload from a valid file publishes and a broken file does not
    #[test]
    fn test_reload_from_path() {
        let dir = std::env::temp_dir().join(format!("rate-tables-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.json");
        let bad = dir.join("bad.json");
        std::fs::write(&good, RATE_TABLES_JSON).unwrap();
        std::fs::write(&bad, RATE_TABLES_JSON.replace("8600", "-1")).unwrap();

        let store = RateTableStore::new(RateTables::new(Some("empty".into()), Vec::new()).unwrap());
        store.reload_from_path(&good).unwrap();
        assert_eq!(store.snapshot().len(), 2);

        let err = store.reload_from_path(&bad).unwrap_err();
        assert!(matches!(err, TableError::InvalidValue { .. }), "got {}", err);
        assert_eq!(store.snapshot().version(), Some("2024-04-fixture"));
        assert_eq!(store.generation(), 2);

        std::fs::remove_dir_all(&dir).ok();
    }
}

// ============================================================================
// VALIDATION TESTS
// ============================================================================

mod validation_tests {
    use super::*;

    /// Verifies a gap between age brackets is rejected
    #[test]
    fn test_bracket_gap() {
        let builder = ProductRatesBuilder::family_health().edit(|p| p.age_brackets[1].max_age = 35);
        assert!(matches!(validate(builder), Err(TableError::AgeBrackets { .. })));
    }

    /// Verifies brackets must start at zero and reach past 120
    #[test]
    fn test_bracket_coverage() {
        let late_start = ProductRatesBuilder::family_health().edit(|p| p.age_brackets[0].min_age = 1);
        assert!(matches!(validate(late_start), Err(TableError::AgeBrackets { .. })));

        let short = ProductRatesBuilder::family_health().edit(|p| {
            if let Some(last) = p.age_brackets.last_mut() {
                last.max_age = 100;
            }
        });
        assert!(matches!(validate(short), Err(TableError::AgeBrackets { .. })));
    }

    /// Verifies overlapping brackets are rejected
    #[test]
    fn test_bracket_overlap() {
        let builder = ProductRatesBuilder::family_health().edit(|p| {
            p.age_brackets.insert(
                2,
                AgeBracket {
                    key: "30-40".to_string(),
                    min_age: 30,
                    max_age: 40,
                },
            )
        });
        assert!(matches!(validate(builder), Err(TableError::AgeBrackets { .. })));
    }

    /// Verifies a missing base-premium cell is rejected
    #[test]
    fn test_incomplete_base_grid() {
        let builder = ProductRatesBuilder::family_health().edit(|p| {
            if let Some(row) = p.base_premiums.get_mut("10L") {
                row.remove("51-65");
            }
        });
        match validate(builder) {
            Err(TableError::MissingEntry { table, key, .. }) => {
                assert_eq!(table, "base_premiums[10L]");
                assert_eq!(key, "51-65");
            }
            other => panic!("expected missing entry, got {:?}", other),
        }
    }

    /// Verifies a rider cost table must cover every tier
    #[test]
    fn test_rider_missing_tier() {
        let builder = ProductRatesBuilder::family_health().edit(|p| {
            if let Some(costs) = p.riders.get_mut("critical-illness") {
                costs.remove("1Cr");
            }
        });
        assert!(matches!(validate(builder), Err(TableError::MissingEntry { .. })));
    }

    /// Verifies a multiplier must exist for every bracket
    #[test]
    fn test_missing_multiplier() {
        let builder = ProductRatesBuilder::family_health().edit(|p| {
            p.age_multipliers.remove("66+");
        });
        assert!(matches!(validate(builder), Err(TableError::MissingEntry { .. })));
    }

    /// Verifies references to undefined keys are rejected
    #[test]
    fn test_unknown_keys() {
        let extra_multiplier = ProductRatesBuilder::family_health().with_multiplier("99+", dec!(3));
        assert!(matches!(validate(extra_multiplier), Err(TableError::UnknownKey { .. })));

        let extra_tier = ProductRatesBuilder::family_health().with_base_premium("2Cr", "0-17", dec!(1));
        assert!(matches!(validate(extra_tier), Err(TableError::UnknownKey { .. })));
    }

    /// Verifies tier ceilings must increase
    #[test]
    fn test_tier_ceilings_increase() {
        let builder = ProductRatesBuilder::family_health().edit(|p| p.coverage_tiers[2].ceiling = dec!(400000));
        assert!(matches!(validate(builder), Err(TableError::InvalidValue { .. })));
    }

    /// Verifies empty stepped chronic pricing is rejected
    #[test]
    fn test_empty_chronic_steps() {
        let builder = ProductRatesBuilder::family_health().edit(|p| {
            if let Some(chronic) = p.chronic_conditions.as_mut() {
                let mut steps = BTreeMap::new();
                for tier in ["3L", "5L", "10L", "1Cr"] {
                    steps.insert(tier.to_string(), Vec::new());
                }
                chronic.pricing = ChronicPricing::Stepped { steps };
            }
        });
        assert!(matches!(validate(builder), Err(TableError::InvalidValue { .. })));
    }

    /// Verifies the tenure range and discount bounds
    #[test]
    fn test_tenure_rules() {
        let inverted = ProductRatesBuilder::family_health().with_tenure(TenureRules {
            min_years: 3,
            max_years: 1,
            discounts: BTreeMap::new(),
        });
        assert!(validate(inverted).is_err());

        let full_discount = ProductRatesBuilder::family_health().with_tenure(TenureRules {
            min_years: 1,
            max_years: 2,
            discounts: BTreeMap::from([(2, dec!(100))]),
        });
        assert!(matches!(validate(full_discount), Err(TableError::InvalidValue { .. })));

        let stray_discount = ProductRatesBuilder::family_health().with_tenure(TenureRules {
            min_years: 1,
            max_years: 2,
            discounts: BTreeMap::from([(5, dec!(10))]),
        });
        assert!(matches!(validate(stray_discount), Err(TableError::UnknownKey { .. })));
    }

    /// Verifies negative costs and invalid plan defaults are rejected
    #[test]
    fn test_value_ranges() {
        let negative = ProductRatesBuilder::family_health().with_multiplier("0-17", dec!(-0.5));
        assert!(matches!(validate(negative), Err(TableError::InvalidValue { .. })));

        let co_payment = ProductRatesBuilder::family_health().with_default_co_payment(Some(CoPayment::percent(dec!(101))));
        assert!(matches!(validate(co_payment), Err(TableError::InvalidValue { .. })));

        let unit_rate = ProductRatesBuilder::family_health().with_waiting_period_unit_rate(dec!(-0.01));
        assert!(matches!(validate(unit_rate), Err(TableError::InvalidValue { .. })));
    }

    /// Verifies the default room category must have a surcharge factor
    #[test]
    fn test_unknown_default_room_category() {
        let builder = ProductRatesBuilder::family_health().edit(|p| p.room_rent.default_category = "ward".into());
        assert!(matches!(validate(builder), Err(TableError::UnknownKey { .. })));
    }
}

// ============================================================================
// CATALOG TESTS
// ============================================================================

mod catalog_tests {
    use super::*;

    /// Verifies two products may not share an id
    #[test]
    fn test_duplicate_product_id() {
        let err = RateTables::new(None, vec![TableFixtures::family_health(), TableFixtures::family_health()])
            .unwrap_err();
        assert!(matches!(err, TableError::DuplicateProduct(ref id) if id == "family-health"));
    }

    /// Verifies two products may not share a policy-number code
    #[test]
    fn test_duplicate_product_code() {
        let mut senior = TableFixtures::senior_care();
        senior.product_code = TableFixtures::family_health().product_code;

        let err = RateTables::new(None, vec![TableFixtures::family_health(), senior]).unwrap_err();
        assert!(matches!(err, TableError::DuplicateProductCode { .. }));
    }

    /// Verifies a malformed product code fails at parse time
    #[test]
    fn test_malformed_product_code() {
        let json = RATE_TABLES_JSON.replace("\"FHLT\"", "\"FH1\"");
        assert!(matches!(RateTables::from_json_str(&json), Err(TableError::Parse(_))));
    }
}
