//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random rating requests that
//! resolve against the fixture tables, so properties exercise the arithmetic
//! rather than the error paths.

use proptest::prelude::*;
use proptest::sample::subsequence;
use rust_decimal::Decimal;

use core_kernel::Currency;
use domain_rating::{CoPayment, CoverageSelection, MemberAge, RatingRequest, RoomRentSelection, MAX_INSURABLE_AGE};

use crate::fixtures::TableFixtures;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::INR),
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::SGD),
        Just(Currency::AED),
    ]
}

/// Strategy for insurable ages
pub fn age_strategy() -> impl Strategy<Value = u32> {
    0u32..=MAX_INSURABLE_AGE
}

/// Strategy for one to six insured members given by age
pub fn members_strategy() -> impl Strategy<Value = Vec<MemberAge>> {
    prop::collection::vec(age_strategy().prop_map(MemberAge::Age), 1..=6)
}

/// Strategy for `family-health` coverage tiers, by key or by sum insured
pub fn coverage_strategy() -> impl Strategy<Value = CoverageSelection> {
    prop_oneof![
        prop::sample::select(vec!["3L", "5L", "10L", "1Cr"])
            .prop_map(|key| CoverageSelection::Tier(key.to_string())),
        (1i64..=10_000_000i64).prop_map(|amount| CoverageSelection::SumInsured(Decimal::from(amount))),
    ]
}

/// Strategy for valid co-payment overrides
pub fn co_payment_strategy() -> impl Strategy<Value = Option<CoPayment>> {
    prop_oneof![
        Just(None),
        Just(Some(CoPayment::none())),
        (0u32..=100u32).prop_map(|pct| Some(CoPayment::percent(Decimal::from(pct)))),
        (0i64..=60_000i64).prop_map(|value| Some(CoPayment::fixed(Decimal::from(value)))),
    ]
}

/// Strategy for room-rent selections known to `family-health`
pub fn room_rent_strategy() -> impl Strategy<Value = Option<RoomRentSelection>> {
    prop_oneof![
        Just(None),
        prop::sample::select(vec!["shared", "single-private", "deluxe"])
            .prop_map(|c| Some(RoomRentSelection::category(c))),
        (0i64..=20_000i64).prop_map(|cap| Some(RoomRentSelection::daily_cap(Decimal::from(cap)))),
    ]
}

/// Strategy for valid `family-health` rating requests
pub fn family_health_request_strategy() -> impl Strategy<Value = RatingRequest> {
    (
        coverage_strategy(),
        members_strategy(),
        subsequence(vec!["restore-benefit", "maternity"], 0..=2),
        subsequence(vec!["critical-illness", "personal-accident"], 0..=2),
        subsequence(vec!["asthma", "diabetes", "hyperlipidemia", "hypertension"], 0..=4),
        room_rent_strategy(),
        co_payment_strategy(),
        0u32..=500u32,
        1u32..=3u32,
    )
        .prop_map(
            |(coverage, members, features, riders, conditions, room_rent, co_payment, days, tenure)| {
                let mut request = RatingRequest::new(TableFixtures::FAMILY_HEALTH, coverage, members)
                    .with_waiting_period_reduction(days)
                    .with_tenure(tenure);
                request.features = features.into_iter().map(String::from).collect();
                request.riders = riders.into_iter().map(String::from).collect();
                request.chronic_conditions = conditions.into_iter().map(String::from).collect();
                request.room_rent = room_rent;
                request.co_payment = co_payment;
                request
            },
        )
}

/// Strategy for `family-health` requests with no add-ons and no adjustments
pub fn plain_request_strategy() -> impl Strategy<Value = RatingRequest> {
    (coverage_strategy(), members_strategy(), 1u32..=3u32).prop_map(|(coverage, members, tenure)| {
        RatingRequest::new(TableFixtures::FAMILY_HEALTH, coverage, members).with_tenure(tenure)
    })
}
