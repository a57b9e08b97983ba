//! Rating request value objects
//!
//! A [`RatingRequest`] is the full policy configuration a caller wants priced.
//! It is immutable once built and deserializes directly from the JSON payload
//! the calling service receives:
//!
//! ```json
//! {
//!   "product_id": "family-health",
//!   "coverage": { "tier": "5L" },
//!   "members": [40, "18-35"],
//!   "riders": ["critical-illness"],
//!   "room_rent": { "category": "single-private" },
//!   "co_payment": { "type": "percent", "value": 10 },
//!   "waiting_period_reduction_days": 90,
//!   "tenure_years": 2
//! }
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the caller identifies the coverage tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageSelection {
    /// A tier key such as `5L` or `1Cr`
    Tier(String),
    /// A sum-insured amount, resolved to the nearest tier at or above it
    SumInsured(Decimal),
}

/// One insured member, given either as an age or as a precomputed bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberAge {
    /// Age in completed years
    Age(u32),
    /// Age-bracket key, e.g. `36-50`
    Bracket(String),
}

impl From<u32> for MemberAge {
    fn from(age: u32) -> Self {
        MemberAge::Age(age)
    }
}

/// Room-rent choice
///
/// Both fields may be present. The category branch is evaluated first and,
/// when it applies, the daily cap is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRentSelection {
    /// Room category tag, e.g. `shared` or `single-private`
    #[serde(default)]
    pub category: Option<String>,
    /// Numeric daily room-rent cap
    #[serde(default)]
    pub daily_cap: Option<Decimal>,
}

impl RoomRentSelection {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            daily_cap: None,
        }
    }

    pub fn daily_cap(cap: Decimal) -> Self {
        Self {
            category: None,
            daily_cap: Some(cap),
        }
    }
}

/// Co-payment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoPaymentKind {
    None,
    /// Percentage of the base premium
    Percent,
    /// Fixed amount in whole currency units
    Fixed,
}

/// Co-payment selection, used both as a plan default and as a request override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoPayment {
    #[serde(rename = "type")]
    pub kind: CoPaymentKind,
    #[serde(default)]
    pub value: Decimal,
}

impl CoPayment {
    pub fn none() -> Self {
        Self {
            kind: CoPaymentKind::None,
            value: Decimal::ZERO,
        }
    }

    pub fn percent(value: Decimal) -> Self {
        Self {
            kind: CoPaymentKind::Percent,
            value,
        }
    }

    pub fn fixed(value: Decimal) -> Self {
        Self {
            kind: CoPaymentKind::Fixed,
            value,
        }
    }

    /// Checks the value range for the co-payment type
    pub fn validate(&self) -> Result<(), String> {
        match self.kind {
            CoPaymentKind::None => Ok(()),
            CoPaymentKind::Percent if self.value < Decimal::ZERO || self.value > Decimal::ONE_HUNDRED => {
                Err(format!("percent co-payment {} is outside 0..=100", self.value))
            }
            CoPaymentKind::Fixed if self.value < Decimal::ZERO => {
                Err(format!("fixed co-payment {} is negative", self.value))
            }
            _ => Ok(()),
        }
    }
}

fn default_tenure() -> u32 {
    1
}

/// Policy configuration to be priced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRequest {
    /// Product identifier in the rate tables
    pub product_id: String,
    /// Coverage tier key or sum insured
    pub coverage: CoverageSelection,
    /// Insured members; the first is the primary insured
    pub members: Vec<MemberAge>,
    /// Selected optional features
    #[serde(default)]
    pub features: Vec<String>,
    /// Selected riders
    #[serde(default)]
    pub riders: Vec<String>,
    /// Selected chronic conditions for per-condition riders
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    #[serde(default)]
    pub room_rent: Option<RoomRentSelection>,
    /// Overrides the plan's default co-payment when present
    #[serde(default)]
    pub co_payment: Option<CoPayment>,
    #[serde(default)]
    pub waiting_period_reduction_days: u32,
    /// Policy years purchased in one transaction
    #[serde(default = "default_tenure")]
    pub tenure_years: u32,
}

impl RatingRequest {
    /// Creates a request with no add-ons, no adjustments and a one-year tenure
    pub fn new(
        product_id: impl Into<String>,
        coverage: CoverageSelection,
        members: Vec<MemberAge>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            coverage,
            members,
            features: Vec::new(),
            riders: Vec::new(),
            chronic_conditions: Vec::new(),
            room_rent: None,
            co_payment: None,
            waiting_period_reduction_days: 0,
            tenure_years: default_tenure(),
        }
    }

    pub fn with_feature(mut self, id: impl Into<String>) -> Self {
        self.features.push(id.into());
        self
    }

    pub fn with_rider(mut self, id: impl Into<String>) -> Self {
        self.riders.push(id.into());
        self
    }

    pub fn with_chronic_condition(mut self, id: impl Into<String>) -> Self {
        self.chronic_conditions.push(id.into());
        self
    }

    pub fn with_room_rent(mut self, selection: RoomRentSelection) -> Self {
        self.room_rent = Some(selection);
        self
    }

    pub fn with_co_payment(mut self, co_payment: CoPayment) -> Self {
        self.co_payment = Some(co_payment);
        self
    }

    pub fn with_waiting_period_reduction(mut self, days: u32) -> Self {
        self.waiting_period_reduction_days = days;
        self
    }

    pub fn with_tenure(mut self, years: u32) -> Self {
        self.tenure_years = years;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_request_deserializes_with_defaults() {
        let json = r#"{
            "product_id": "family-health",
            "coverage": { "tier": "5L" },
            "members": [40, "18-35"]
        }"#;
        let request: RatingRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.coverage, CoverageSelection::Tier("5L".to_string()));
        assert_eq!(request.members, vec![MemberAge::Age(40), MemberAge::Bracket("18-35".to_string())]);
        assert_eq!(request.tenure_years, 1);
        assert!(request.riders.is_empty());
        assert!(request.co_payment.is_none());
    }

    #[test]
    fn test_sum_insured_and_co_payment_payload() {
        let json = r#"{
            "product_id": "family-health",
            "coverage": { "sum_insured": 450000 },
            "members": [30],
            "co_payment": { "type": "fixed", "value": 500 },
            "tenure_years": 3
        }"#;
        let request: RatingRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.coverage, CoverageSelection::SumInsured(dec!(450000)));
        assert_eq!(request.co_payment, Some(CoPayment::fixed(dec!(500))));
        assert_eq!(request.tenure_years, 3);
    }

    #[test]
    fn test_co_payment_validation() {
        assert!(CoPayment::percent(dec!(20)).validate().is_ok());
        assert!(CoPayment::percent(dec!(120)).validate().is_err());
        assert!(CoPayment::fixed(dec!(-1)).validate().is_err());
        assert!(CoPayment::none().validate().is_ok());
    }
}
