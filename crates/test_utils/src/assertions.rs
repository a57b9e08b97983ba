//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_rating::{RatingError, RatingResult};

/// Asserts that a Money value equals a whole number of units
pub fn assert_money_units(actual: &Money, expected: i64) {
    assert_eq!(
        actual.amount(),
        Decimal::from(expected),
        "Expected {} {}, got {}",
        actual.currency().symbol(),
        expected,
        actual
    );
}

/// Asserts that a Money value has no fractional part
pub fn assert_whole_units(money: &Money) {
    assert!(
        money.amount().fract().is_zero(),
        "Expected whole currency units, got {}",
        money.amount()
    );
}

/// Asserts that the final premium equals `expected` units
pub fn assert_final_premium(result: &RatingResult, expected: i64) {
    assert_eq!(
        result.final_premium.amount(),
        Decimal::from(expected),
        "Final premium mismatch for product {} (tier {}, tenure {}): base={}, add-ons={}, annual={}",
        result.product_id,
        result.coverage_tier,
        result.tenure_years,
        result.base_premium,
        result.add_on_total,
        result.annual_premium
    );
}

/// Asserts every internal consistency rule of a rating breakdown
///
/// - every amount is in whole units
/// - line items add up to the add-on total
/// - the annual premium is the clamped sum of its parts
/// - the tenure step reconciles with the final and per-year figures
pub fn assert_breakdown_consistent(result: &RatingResult) {
    for money in [
        &result.base_premium,
        &result.add_on_total,
        &result.chronic_condition_total,
        &result.room_rent_adjustment,
        &result.co_payment_adjustment,
        &result.waiting_period_adjustment,
        &result.annual_premium,
        &result.tenure_discount_amount,
        &result.final_premium,
        &result.per_year_premium,
    ] {
        assert_whole_units(money);
        assert_eq!(money.currency(), result.currency, "Currency mismatch in breakdown");
    }

    let line_total: Decimal = result.line_items.iter().map(|item| item.amount.amount()).sum();
    assert_eq!(line_total, result.add_on_total.amount(), "Line items do not add up to the add-on total");

    assert!(
        result.co_payment_adjustment.amount() <= Decimal::ZERO,
        "Co-payment adjustment must not be positive, got {}",
        result.co_payment_adjustment
    );

    let expected_annual = result.unclamped_annual().max(Decimal::ZERO);
    assert_eq!(result.annual_premium.amount(), expected_annual, "Annual premium is not the clamped sum of its parts");
    assert_eq!(result.is_clamped(), result.unclamped_annual() < Decimal::ZERO, "Clamp warning mismatch");

    let undiscounted = result.annual_premium.amount() * Decimal::from(result.tenure_years);
    assert_eq!(
        undiscounted - result.tenure_discount_amount.amount(),
        result.final_premium.amount(),
        "Tenure discount does not reconcile"
    );
    assert!(result.final_premium.amount() >= Decimal::ZERO, "Final premium is negative");
}

/// Asserts that a rating failed with the given error code
pub fn assert_rating_error<T: std::fmt::Debug>(result: Result<T, RatingError>, expected_code: &str) {
    match result {
        Ok(value) => panic!("Expected rating error {}, got Ok({:?})", expected_code, value),
        Err(err) => assert_eq!(err.code(), expected_code, "Unexpected rating error: {}", err),
    }
}

/// Asserts that a string has the shape `BS-XXXX-YYYY-NNNN`
pub fn assert_policy_number_format(value: &str) {
    let parts: Vec<&str> = value.split('-').collect();
    let valid = parts.len() == 4
        && parts[0] == "BS"
        && parts[1].len() == 4
        && parts[1].bytes().all(|b| b.is_ascii_uppercase())
        && parts[2].len() == 4
        && parts[2].bytes().all(|b| b.is_ascii_digit())
        && parts[3].len() == 4
        && parts[3].bytes().all(|b| b.is_ascii_digit());
    assert!(valid, "Not a policy number: {}", value);
}

/// Asserts that a string has the shape `TXN-` followed by 8 of `[A-Z0-9]`
pub fn assert_transaction_id_format(value: &str) {
    let valid = value
        .strip_prefix("TXN-")
        .map(|body| body.len() == 8 && body.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()))
        .unwrap_or(false);
    assert!(valid, "Not a transaction id: {}", value);
}
