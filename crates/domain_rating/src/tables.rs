//! Rate table schema and lookups
//!
//! A [`RateTables`] value is the complete, validated pricing configuration for
//! every product. It can only be built through [`RateTables::new`] (or the
//! loader), which validates every product before the value exists, so a
//! lookup at rating time either finds a row or reports a request error. It
//! never finds a half-filled table.
//!
//! # Shape of one product
//!
//! ```text
//! base_premiums   tier ─▶ age bracket ─▶ whole-unit premium
//! features/riders id   ─▶ tier        ─▶ unit cost
//! age_multipliers bracket ─▶ scalar
//! tenure          years ─▶ discount percent
//! room_rent       category ─▶ surcharge factor, default cap, cap excess rate
//! chronic         flat per condition, or stepped by selection order
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, ProductCode, Rate};

use crate::error::{RatingError, TableError};
use crate::request::{CoPayment, CoverageSelection, MemberAge};

/// Highest age every product's brackets must cover
pub const MAX_INSURABLE_AGE: u32 = 120;

/// Unit costs keyed by coverage tier
pub type TierCosts = BTreeMap<String, Decimal>;

/// A discrete sum-insured bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageTier {
    /// Tier key, e.g. `5L`
    pub key: String,
    /// Largest sum insured this tier covers
    pub ceiling: Decimal,
}

/// Half-open age interval `[min_age, max_age)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBracket {
    pub key: String,
    pub min_age: u32,
    pub max_age: u32,
}

impl AgeBracket {
    pub fn contains(&self, age: u32) -> bool {
        age >= self.min_age && age < self.max_age
    }
}

/// How member premiums combine into the base premium of a multi-member policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberAggregation {
    /// Only the first (primary) member is rated
    Primary,
    /// Member premiums are added
    Sum,
    /// The most expensive member sets the premium
    Max,
}

impl MemberAggregation {
    /// Combines per-member premiums; `None` for an empty slice
    pub fn combine(&self, premiums: &[Decimal]) -> Option<Decimal> {
        match self {
            MemberAggregation::Primary => premiums.first().copied(),
            MemberAggregation::Sum => {
                if premiums.is_empty() {
                    None
                } else {
                    Some(premiums.iter().copied().sum())
                }
            }
            MemberAggregation::Max => premiums.iter().copied().max(),
        }
    }
}

/// Pricing of per-condition chronic riders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChronicPricing {
    /// Every selected condition costs the same
    Flat { per_condition: TierCosts },
    /// The n-th selected condition costs `steps[min(n, len - 1)]`
    Stepped { steps: BTreeMap<String, Vec<Decimal>> },
}

impl ChronicPricing {
    /// Cost of the condition at zero-based `position` in the selection
    pub fn cost_at(&self, tier: &str, position: usize) -> Option<Decimal> {
        match self {
            ChronicPricing::Flat { per_condition } => per_condition.get(tier).copied(),
            ChronicPricing::Stepped { steps } => {
                let steps = steps.get(tier)?;
                let last = steps.len().checked_sub(1)?;
                steps.get(position.min(last)).copied()
            }
        }
    }
}

/// Chronic-condition riders offered by a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChronicConditionRules {
    pub conditions: BTreeSet<String>,
    pub pricing: ChronicPricing,
}

fn default_cap_excess_rate() -> Decimal {
    dec!(0.03)
}

/// Room-rent rules of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRentRules {
    /// Category included in the base premium
    pub default_category: String,
    /// Daily cap included in the base premium; `None` means uncapped
    #[serde(default)]
    pub default_daily_cap: Option<Decimal>,
    /// Fraction of base premium charged per category
    pub surcharge_factors: BTreeMap<String, Decimal>,
    /// Fraction of base premium charged when a higher daily cap is requested
    #[serde(default = "default_cap_excess_rate")]
    pub cap_excess_rate: Decimal,
}

/// Allowed payment tenures and their multi-year discounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenureRules {
    pub min_years: u32,
    pub max_years: u32,
    /// Discount percentage by tenure; a missing tenure gets no discount
    #[serde(default)]
    pub discounts: BTreeMap<u32, Decimal>,
}

impl TenureRules {
    pub fn allows(&self, years: u32) -> bool {
        years >= self.min_years && years <= self.max_years
    }

    pub fn discount_for(&self, years: u32) -> Rate {
        self.discounts
            .get(&years)
            .map(|pct| Rate::from_percentage(*pct))
            .unwrap_or_else(Rate::zero)
    }
}

impl Default for TenureRules {
    fn default() -> Self {
        Self {
            min_years: 1,
            max_years: 1,
            discounts: BTreeMap::new(),
        }
    }
}

/// Complete pricing configuration of one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRates {
    pub product_id: String,
    /// Four-letter code used in policy numbers
    pub product_code: ProductCode,
    #[serde(default)]
    pub currency: Currency,
    /// Ordered by ascending ceiling
    pub coverage_tiers: Vec<CoverageTier>,
    /// Ordered, contiguous, covering `0..=120`
    pub age_brackets: Vec<AgeBracket>,
    pub base_premiums: BTreeMap<String, BTreeMap<String, Decimal>>,
    pub member_aggregation: MemberAggregation,
    #[serde(default)]
    pub features: BTreeMap<String, TierCosts>,
    #[serde(default)]
    pub riders: BTreeMap<String, TierCosts>,
    pub age_multipliers: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub chronic_conditions: Option<ChronicConditionRules>,
    pub room_rent: RoomRentRules,
    #[serde(default)]
    pub default_co_payment: Option<CoPayment>,
    #[serde(default)]
    pub waiting_period_unit_rate: Decimal,
    #[serde(default)]
    pub tenure: TenureRules,
}

impl ProductRates {
    /// Resolves the requested coverage to a tier
    ///
    /// A direct key must exist. A sum insured picks the smallest tier whose
    /// ceiling is at or above the amount.
    pub fn resolve_tier(&self, selection: &CoverageSelection) -> Result<&CoverageTier, RatingError> {
        let found = match selection {
            CoverageSelection::Tier(key) => self.coverage_tiers.iter().find(|t| &t.key == key),
            CoverageSelection::SumInsured(amount) if *amount > Decimal::ZERO => {
                self.coverage_tiers.iter().find(|t| t.ceiling >= *amount)
            }
            CoverageSelection::SumInsured(_) => None,
        };

        found.ok_or_else(|| RatingError::InvalidCoverageTier {
            product: self.product_id.clone(),
            requested: match selection {
                CoverageSelection::Tier(key) => key.clone(),
                CoverageSelection::SumInsured(amount) => format!("sum insured {}", amount),
            },
        })
    }

    /// Finds the bracket containing `age`
    pub fn bracket_for_age(&self, age: u32) -> Option<&AgeBracket> {
        self.age_brackets.iter().find(|b| b.contains(age))
    }

    /// Resolves a member to its age bracket
    pub fn resolve_member(&self, member: &MemberAge) -> Result<&AgeBracket, RatingError> {
        let (found, requested) = match member {
            MemberAge::Age(age) if *age <= MAX_INSURABLE_AGE => (self.bracket_for_age(*age), age.to_string()),
            MemberAge::Age(age) => (None, age.to_string()),
            MemberAge::Bracket(key) => (self.age_brackets.iter().find(|b| &b.key == key), key.clone()),
        };

        found.ok_or_else(|| RatingError::InvalidAge {
            product: self.product_id.clone(),
            requested,
        })
    }

    pub fn base_premium(&self, tier: &str, bracket: &str) -> Option<Decimal> {
        self.base_premiums.get(tier)?.get(bracket).copied()
    }

    pub fn age_multiplier(&self, bracket: &str) -> Decimal {
        self.age_multipliers.get(bracket).copied().unwrap_or(Decimal::ONE)
    }

    /// Checks every structural invariant of the product
    pub fn validate(&self) -> Result<(), TableError> {
        let product = self.product_id.as_str();
        if product.trim().is_empty() {
            return Err(TableError::invalid("<unnamed>", "product_id", "must not be empty"));
        }

        let tiers = self.validate_tiers()?;
        let brackets = self.validate_brackets()?;

        // Base premium grid must be complete and reference only known keys
        for tier in &tiers {
            let row = self
                .base_premiums
                .get(*tier)
                .ok_or_else(|| TableError::missing(product, "base_premiums", tier))?;
            for bracket in &brackets {
                let premium = row
                    .get(*bracket)
                    .ok_or_else(|| TableError::missing(product, format!("base_premiums[{}]", tier), bracket))?;
                non_negative(product, &format!("base_premiums[{}][{}]", tier, bracket), *premium)?;
            }
            if let Some(extra) = row.keys().find(|k| !brackets.contains(k.as_str())) {
                return Err(TableError::unknown(product, format!("base_premiums[{}]", tier), extra));
            }
        }
        if let Some(extra) = self.base_premiums.keys().find(|k| !tiers.contains(k.as_str())) {
            return Err(TableError::unknown(product, "base_premiums", extra));
        }

        for bracket in &brackets {
            let multiplier = self
                .age_multipliers
                .get(*bracket)
                .ok_or_else(|| TableError::missing(product, "age_multipliers", bracket))?;
            non_negative(product, &format!("age_multipliers[{}]", bracket), *multiplier)?;
        }
        if let Some(extra) = self.age_multipliers.keys().find(|k| !brackets.contains(k.as_str())) {
            return Err(TableError::unknown(product, "age_multipliers", extra));
        }

        for (table, entries) in [("features", &self.features), ("riders", &self.riders)] {
            for (id, costs) in entries {
                validate_tier_costs(product, &format!("{}[{}]", table, id), costs, &tiers)?;
            }
        }

        if let Some(chronic) = &self.chronic_conditions {
            self.validate_chronic(chronic, &tiers)?;
        }

        self.validate_room_rent()?;

        if let Some(co_payment) = &self.default_co_payment {
            co_payment
                .validate()
                .map_err(|detail| TableError::invalid(product, "default_co_payment", detail))?;
        }

        non_negative(product, "waiting_period_unit_rate", self.waiting_period_unit_rate)?;
        self.validate_tenure()
    }

    fn validate_tiers(&self) -> Result<BTreeSet<&str>, TableError> {
        let product = self.product_id.as_str();
        if self.coverage_tiers.is_empty() {
            return Err(TableError::EmptyTable {
                product: product.to_string(),
                table: "coverage_tiers",
            });
        }

        let mut keys = BTreeSet::new();
        let mut previous: Option<&CoverageTier> = None;
        for tier in &self.coverage_tiers {
            if !keys.insert(tier.key.as_str()) {
                return Err(TableError::DuplicateKey {
                    product: product.to_string(),
                    table: "coverage_tiers",
                    key: tier.key.clone(),
                });
            }
            if tier.ceiling <= Decimal::ZERO {
                return Err(TableError::invalid(product, format!("coverage_tiers[{}].ceiling", tier.key), "must be positive"));
            }
            if let Some(prev) = previous {
                if tier.ceiling <= prev.ceiling {
                    return Err(TableError::invalid(
                        product,
                        "coverage_tiers",
                        format!("ceiling of {} must exceed ceiling of {}", tier.key, prev.key),
                    ));
                }
            }
            previous = Some(tier);
        }
        Ok(keys)
    }

    fn validate_brackets(&self) -> Result<BTreeSet<&str>, TableError> {
        let product = self.product_id.as_str();
        let gap = |detail: String| TableError::AgeBrackets {
            product: product.to_string(),
            detail,
        };

        let first = self.age_brackets.first().ok_or_else(|| TableError::EmptyTable {
            product: product.to_string(),
            table: "age_brackets",
        })?;
        if first.min_age != 0 {
            return Err(gap(format!("first bracket {} starts at {}, not 0", first.key, first.min_age)));
        }

        let mut keys = BTreeSet::new();
        let mut expected_start = 0;
        for bracket in &self.age_brackets {
            if !keys.insert(bracket.key.as_str()) {
                return Err(TableError::DuplicateKey {
                    product: product.to_string(),
                    table: "age_brackets",
                    key: bracket.key.clone(),
                });
            }
            if bracket.min_age >= bracket.max_age {
                return Err(gap(format!("bracket {} is empty", bracket.key)));
            }
            if bracket.min_age != expected_start {
                return Err(gap(format!(
                    "bracket {} starts at {} but the previous bracket ends at {}",
                    bracket.key, bracket.min_age, expected_start
                )));
            }
            expected_start = bracket.max_age;
        }

        if expected_start <= MAX_INSURABLE_AGE {
            return Err(gap(format!("brackets end at {} and do not cover age {}", expected_start, MAX_INSURABLE_AGE)));
        }
        Ok(keys)
    }

    fn validate_chronic(&self, chronic: &ChronicConditionRules, tiers: &BTreeSet<&str>) -> Result<(), TableError> {
        let product = self.product_id.as_str();
        if chronic.conditions.is_empty() {
            return Err(TableError::EmptyTable {
                product: product.to_string(),
                table: "chronic_conditions.conditions",
            });
        }
        match &chronic.pricing {
            ChronicPricing::Flat { per_condition } => {
                validate_tier_costs(product, "chronic_conditions.per_condition", per_condition, tiers)
            }
            ChronicPricing::Stepped { steps } => {
                for tier in tiers {
                    let table = format!("chronic_conditions.steps[{}]", tier);
                    let tier_steps = steps
                        .get(*tier)
                        .ok_or_else(|| TableError::missing(product, "chronic_conditions.steps", tier))?;
                    if tier_steps.is_empty() {
                        return Err(TableError::invalid(product, table, "must list at least one step"));
                    }
                    for step in tier_steps {
                        non_negative(product, &table, *step)?;
                    }
                }
                match steps.keys().find(|k| !tiers.contains(k.as_str())) {
                    Some(extra) => Err(TableError::unknown(product, "chronic_conditions.steps", extra)),
                    None => Ok(()),
                }
            }
        }
    }

    fn validate_room_rent(&self) -> Result<(), TableError> {
        let product = self.product_id.as_str();
        let rules = &self.room_rent;
        if !rules.surcharge_factors.contains_key(&rules.default_category) {
            return Err(TableError::unknown(product, "room_rent.default_category", &rules.default_category));
        }
        for (category, factor) in &rules.surcharge_factors {
            non_negative(product, &format!("room_rent.surcharge_factors[{}]", category), *factor)?;
        }
        if let Some(cap) = rules.default_daily_cap {
            if cap <= Decimal::ZERO {
                return Err(TableError::invalid(product, "room_rent.default_daily_cap", "must be positive"));
            }
        }
        non_negative(product, "room_rent.cap_excess_rate", rules.cap_excess_rate)
    }

    fn validate_tenure(&self) -> Result<(), TableError> {
        let product = self.product_id.as_str();
        let tenure = &self.tenure;
        if tenure.min_years == 0 || tenure.min_years > tenure.max_years {
            return Err(TableError::invalid(
                product,
                "tenure",
                format!("range {}..={} is invalid", tenure.min_years, tenure.max_years),
            ));
        }
        for (years, pct) in &tenure.discounts {
            if !tenure.allows(*years) {
                return Err(TableError::unknown(product, "tenure.discounts", &years.to_string()));
            }
            if *pct < Decimal::ZERO || *pct >= Decimal::ONE_HUNDRED {
                return Err(TableError::invalid(
                    product,
                    format!("tenure.discounts[{}]", years),
                    format!("{} is outside [0, 100)", pct),
                ));
            }
        }
        Ok(())
    }
}

fn non_negative(product: &str, field: &str, value: Decimal) -> Result<(), TableError> {
    if value < Decimal::ZERO {
        Err(TableError::invalid(product, field, format!("{} is negative", value)))
    } else {
        Ok(())
    }
}

fn validate_tier_costs(product: &str, table: &str, costs: &TierCosts, tiers: &BTreeSet<&str>) -> Result<(), TableError> {
    for tier in tiers {
        let cost = costs
            .get(*tier)
            .ok_or_else(|| TableError::missing(product, table, tier))?;
        non_negative(product, &format!("{}[{}]", table, tier), *cost)?;
    }
    match costs.keys().find(|k| !tiers.contains(k.as_str())) {
        Some(extra) => Err(TableError::unknown(product, table, extra)),
        None => Ok(()),
    }
}

/// Validated, read-only pricing configuration for all products
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateTables {
    version: Option<String>,
    products: BTreeMap<String, ProductRates>,
}

impl RateTables {
    /// Validates products and builds the table set
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found: an invalid product, a
    /// duplicate product id, or a product code shared by two products.
    pub fn new(version: Option<String>, products: Vec<ProductRates>) -> Result<Self, TableError> {
        let mut by_id = BTreeMap::new();
        let mut codes: HashMap<ProductCode, String> = HashMap::new();

        for product in products {
            product.validate()?;
            if by_id.contains_key(&product.product_id) {
                return Err(TableError::DuplicateProduct(product.product_id));
            }
            if let Some(first) = codes.get(&product.product_code) {
                return Err(TableError::DuplicateProductCode {
                    code: product.product_code.to_string(),
                    first: first.clone(),
                    second: product.product_id.clone(),
                });
            }
            codes.insert(product.product_code.clone(), product.product_id.clone());
            by_id.insert(product.product_id.clone(), product);
        }

        Ok(Self {
            version,
            products: by_id,
        })
    }

    /// Version label of the loaded document, if it carried one
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn product(&self, product_id: &str) -> Option<&ProductRates> {
        self.products.get(product_id)
    }

    pub fn products(&self) -> impl Iterator<Item = &ProductRates> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Product id to policy-number code mapping
    pub fn product_codes(&self) -> impl Iterator<Item = (&str, &ProductCode)> {
        self.products
            .values()
            .map(|p| (p.product_id.as_str(), &p.product_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation() {
        let premiums = [dec!(8600), dec!(5200), dec!(12400)];
        assert_eq!(MemberAggregation::Primary.combine(&premiums), Some(dec!(8600)));
        assert_eq!(MemberAggregation::Sum.combine(&premiums), Some(dec!(26200)));
        assert_eq!(MemberAggregation::Max.combine(&premiums), Some(dec!(12400)));
        assert_eq!(MemberAggregation::Sum.combine(&[]), None);
    }

    #[test]
    fn test_stepped_chronic_pricing_repeats_last_step() {
        let mut steps = BTreeMap::new();
        steps.insert("5L".to_string(), vec![dec!(3000), dec!(1800)]);
        let pricing = ChronicPricing::Stepped { steps };

        assert_eq!(pricing.cost_at("5L", 0), Some(dec!(3000)));
        assert_eq!(pricing.cost_at("5L", 1), Some(dec!(1800)));
        assert_eq!(pricing.cost_at("5L", 5), Some(dec!(1800)));
        assert_eq!(pricing.cost_at("10L", 0), None);
    }

    #[test]
    fn test_bracket_is_half_open() {
        let bracket = AgeBracket {
            key: "36-50".to_string(),
            min_age: 36,
            max_age: 51,
        };
        assert!(bracket.contains(36));
        assert!(bracket.contains(50));
        assert!(!bracket.contains(51));
        assert!(!bracket.contains(35));
    }

    #[test]
    fn test_tenure_discount_defaults_to_zero() {
        let mut rules = TenureRules {
            min_years: 1,
            max_years: 3,
            discounts: BTreeMap::new(),
        };
        rules.discounts.insert(2, dec!(5));

        assert_eq!(rules.discount_for(2).as_decimal(), dec!(0.05));
        assert_eq!(rules.discount_for(3), Rate::zero());
        assert!(rules.allows(3));
        assert!(!rules.allows(4));
    }
}
