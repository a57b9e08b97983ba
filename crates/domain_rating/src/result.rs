//! Rating result and breakdown types
//!
//! A [`RatingResult`] carries every number a caller needs to render the
//! premium breakdown, plus the keys the engine resolved, so the computation
//! can be reproduced and audited from the result alone.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, Rate};

/// Source table of a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    Feature,
    Rider,
    ChronicCondition,
}

/// One priced add-on, rounded on its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: LineItemKind,
    pub id: String,
    /// Cost from the table for the resolved tier
    pub unit_cost: Decimal,
    /// Age multiplier applied to the unit cost
    pub multiplier: Decimal,
    /// `unit_cost * multiplier`, rounded to whole units
    pub amount: Money,
}

/// Non-fatal anomaly observed while rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RatingWarning {
    /// The annual total came out negative and was clamped to zero
    NegativePremiumClamped { unclamped: Money },
}

/// Premium breakdown for one rating request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingResult {
    pub product_id: String,
    pub currency: Currency,
    /// Resolved coverage-tier key
    pub coverage_tier: String,
    /// Resolved age-bracket key of each member, in request order
    pub member_brackets: Vec<String>,
    /// Bracket whose multiplier priced the add-ons (eldest member)
    pub rating_bracket: String,
    pub age_multiplier: Decimal,
    pub base_premium: Money,
    pub line_items: Vec<LineItem>,
    /// Sum of every line item, chronic conditions included
    pub add_on_total: Money,
    /// Chronic-condition share of `add_on_total`
    pub chronic_condition_total: Money,
    pub room_rent_adjustment: Money,
    /// Zero or negative
    pub co_payment_adjustment: Money,
    pub waiting_period_adjustment: Money,
    /// Single-year total before the tenure step, clamped at zero
    pub annual_premium: Money,
    pub tenure_years: u32,
    pub tenure_discount_rate: Rate,
    /// `annual_premium * tenure_years - final_premium`
    pub tenure_discount_amount: Money,
    /// Amount payable for the whole tenure
    pub final_premium: Money,
    /// `final_premium / tenure_years`, for "per year" display
    pub per_year_premium: Money,
    #[serde(default)]
    pub warnings: Vec<RatingWarning>,
}

impl RatingResult {
    /// True if the annual total was clamped to zero
    pub fn is_clamped(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, RatingWarning::NegativePremiumClamped { .. }))
    }

    /// Line items of one kind
    pub fn items_of(&self, kind: LineItemKind) -> impl Iterator<Item = &LineItem> {
        self.line_items.iter().filter(move |item| item.kind == kind)
    }

    /// Signed single-year total before clamping
    pub fn unclamped_annual(&self) -> Decimal {
        self.base_premium.amount()
            + self.add_on_total.amount()
            + self.room_rent_adjustment.amount()
            + self.co_payment_adjustment.amount()
            + self.waiting_period_adjustment.amount()
    }
}
