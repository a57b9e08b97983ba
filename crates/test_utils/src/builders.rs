//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use rust_decimal::Decimal;

use domain_rating::{
    CoPayment, CoverageSelection, MemberAge, MemberAggregation, ProductRates, RateTables, RatingRequest,
    RoomRentSelection, TenureRules,
};

use crate::fixtures::TableFixtures;

/// Builder for rating requests, defaulting to `family-health` `5L` with one member aged 40
pub struct RatingRequestBuilder {
    request: RatingRequest,
}

impl Default for RatingRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RatingRequestBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            request: RatingRequest::new(
                TableFixtures::FAMILY_HEALTH,
                CoverageSelection::Tier("5L".to_string()),
                vec![MemberAge::Age(40)],
            ),
        }
    }

    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.request.product_id = product_id.into();
        self
    }

    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.request.coverage = CoverageSelection::Tier(tier.into());
        self
    }

    pub fn with_sum_insured(mut self, amount: Decimal) -> Self {
        self.request.coverage = CoverageSelection::SumInsured(amount);
        self
    }

    /// Replaces the member list with members of the given ages
    pub fn with_ages(mut self, ages: &[u32]) -> Self {
        self.request.members = ages.iter().copied().map(MemberAge::Age).collect();
        self
    }

    /// Appends a member given by bracket key
    pub fn with_bracket_member(mut self, bracket: impl Into<String>) -> Self {
        self.request.members.push(MemberAge::Bracket(bracket.into()));
        self
    }

    pub fn without_members(mut self) -> Self {
        self.request.members.clear();
        self
    }

    pub fn with_feature(mut self, id: impl Into<String>) -> Self {
        self.request = self.request.with_feature(id);
        self
    }

    pub fn with_rider(mut self, id: impl Into<String>) -> Self {
        self.request = self.request.with_rider(id);
        self
    }

    pub fn with_chronic_condition(mut self, id: impl Into<String>) -> Self {
        self.request = self.request.with_chronic_condition(id);
        self
    }

    pub fn with_room_category(mut self, category: impl Into<String>) -> Self {
        let mut selection = self.request.room_rent.take().unwrap_or_default();
        selection.category = Some(category.into());
        self.request.room_rent = Some(selection);
        self
    }

    pub fn with_daily_cap(mut self, cap: Decimal) -> Self {
        let mut selection: RoomRentSelection = self.request.room_rent.take().unwrap_or_default();
        selection.daily_cap = Some(cap);
        self.request.room_rent = Some(selection);
        self
    }

    pub fn with_co_payment(mut self, co_payment: CoPayment) -> Self {
        self.request.co_payment = Some(co_payment);
        self
    }

    pub fn with_waiting_period_reduction(mut self, days: u32) -> Self {
        self.request.waiting_period_reduction_days = days;
        self
    }

    pub fn with_tenure(mut self, years: u32) -> Self {
        self.request.tenure_years = years;
        self
    }

    /// Builds the request
    pub fn build(self) -> RatingRequest {
        self.request
    }
}

/// Builder for single-product rate tables, starting from a fixture product
pub struct ProductRatesBuilder {
    product: ProductRates,
}

impl Default for ProductRatesBuilder {
    fn default() -> Self {
        Self::family_health()
    }
}

impl ProductRatesBuilder {
    pub fn family_health() -> Self {
        Self {
            product: TableFixtures::family_health(),
        }
    }

    pub fn senior_care() -> Self {
        Self {
            product: TableFixtures::senior_care(),
        }
    }

    pub fn with_aggregation(mut self, aggregation: MemberAggregation) -> Self {
        self.product.member_aggregation = aggregation;
        self
    }

    pub fn with_default_co_payment(mut self, co_payment: Option<CoPayment>) -> Self {
        self.product.default_co_payment = co_payment;
        self
    }

    pub fn with_waiting_period_unit_rate(mut self, rate: Decimal) -> Self {
        self.product.waiting_period_unit_rate = rate;
        self
    }

    pub fn with_default_daily_cap(mut self, cap: Option<Decimal>) -> Self {
        self.product.room_rent.default_daily_cap = cap;
        self
    }

    pub fn with_tenure(mut self, tenure: TenureRules) -> Self {
        self.product.tenure = tenure;
        self
    }

    /// Sets the age multiplier of one bracket
    pub fn with_multiplier(mut self, bracket: impl Into<String>, multiplier: Decimal) -> Self {
        self.product.age_multipliers.insert(bracket.into(), multiplier);
        self
    }

    /// Sets one base-premium cell
    pub fn with_base_premium(mut self, tier: &str, bracket: impl Into<String>, premium: Decimal) -> Self {
        self.product
            .base_premiums
            .entry(tier.to_string())
            .or_default()
            .insert(bracket.into(), premium);
        self
    }

    /// Applies an arbitrary edit, for invalid-table tests
    pub fn edit(mut self, f: impl FnOnce(&mut ProductRates)) -> Self {
        f(&mut self.product);
        self
    }

    /// Returns the product without validating it
    pub fn build(self) -> ProductRates {
        self.product
    }

    /// Validates the product into single-product tables
    pub fn build_tables(self) -> RateTables {
        TableFixtures::tables_of(vec![self.product])
    }
}
