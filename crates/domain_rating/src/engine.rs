//! Premium rating engine
//!
//! [`rate`] is a pure function of a request and a table snapshot. It performs
//! no I/O, holds no state and never mutates the tables, so any number of
//! callers can share one snapshot.
//!
//! # Order of operations
//!
//! ```text
//!  1. coverage tier        direct key, or nearest tier at or above sum insured
//!  2. age brackets         one per member
//!  3. base premium         table[tier][bracket], aggregated per product
//!  4. features, riders     cost[tier] * multiplier[rating bracket], rounded per line
//!  5. chronic conditions   flat or stepped, rounded per line
//!  6. room rent            base * surcharge[category]  |  base * cap excess rate
//!  7. co-payment           -(base * pct / 100)  |  -fixed
//!  8. waiting period       base * min(days, 365) / 30 * unit rate
//!  9. annual               base + add-ons + 6 + 7 + 8, clamped at zero
//! 10. tenure               annual * years * (1 - discount[years])
//! ```
//!
//! Steps 6 to 8 are fractions of the base premium, never of a running total.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::money::round_whole;
use core_kernel::{Currency, Money, Rate};

use crate::error::RatingError;
use crate::request::{CoPaymentKind, RatingRequest, RoomRentSelection};
use crate::result::{LineItem, LineItemKind, RatingResult, RatingWarning};
use crate::tables::{AgeBracket, ProductRates, RateTables, TierCosts};

/// Waiting-period reductions beyond this many days have no further effect
pub const MAX_WAITING_PERIOD_DAYS: u32 = 365;

/// Rates a request against a table snapshot
///
/// # Errors
///
/// Returns a [`RatingError`] for any part of the request that does not
/// resolve against the product's tables. A negative annual total is not an
/// error: it is clamped to zero and reported in `warnings`.
pub fn rate(request: &RatingRequest, tables: &RateTables) -> Result<RatingResult, RatingError> {
    let product = tables
        .product(&request.product_id)
        .ok_or_else(|| RatingError::UnknownProduct(request.product_id.clone()))?;
    let currency = product.currency;

    if !product.tenure.allows(request.tenure_years) {
        return Err(RatingError::InvalidTenure {
            tenure: request.tenure_years,
            min: product.tenure.min_years,
            max: product.tenure.max_years,
        });
    }

    let tier = product.resolve_tier(&request.coverage)?;

    let brackets = request
        .members
        .iter()
        .map(|member| product.resolve_member(member))
        .collect::<Result<Vec<&AgeBracket>, RatingError>>()?;

    // Add-ons follow the eldest member's bracket; none exists for an empty member list
    let Some(rating_bracket) = brackets.iter().copied().max_by_key(|b| b.min_age) else {
        return Err(RatingError::NoInsuredMembers);
    };

    let base = base_premium(product, &tier.key, &brackets)?;
    let multiplier = product.age_multiplier(&rating_bracket.key);

    let mut line_items = Vec::new();
    price_add_ons(
        &request.features,
        &product.features,
        LineItemKind::Feature,
        &tier.key,
        multiplier,
        currency,
        &mut line_items,
    )?;
    price_add_ons(
        &request.riders,
        &product.riders,
        LineItemKind::Rider,
        &tier.key,
        multiplier,
        currency,
        &mut line_items,
    )?;
    price_chronic_conditions(request, product, &tier.key, currency, &mut line_items)?;

    let add_on_total = Money::sum(currency, line_items.iter().map(|item| &item.amount))?;
    let chronic_total = Money::sum(
        currency,
        line_items
            .iter()
            .filter(|item| item.kind == LineItemKind::ChronicCondition)
            .map(|item| &item.amount),
    )?;

    let room_rent = room_rent_adjustment(product, request.room_rent.as_ref(), base)?;
    let co_payment = co_payment_adjustment(product, request, base)?;
    let waiting_period = waiting_period_adjustment(product, request.waiting_period_reduction_days, base);

    let unclamped = Money::whole(
        base + add_on_total.amount() + room_rent + co_payment + waiting_period,
        currency,
    );
    let annual = unclamped.clamp_non_negative();
    let mut warnings = Vec::new();
    if unclamped.is_negative() {
        warnings.push(RatingWarning::NegativePremiumClamped { unclamped });
    }

    let tenure = apply_tenure(product, request.tenure_years, annual.amount());

    Ok(RatingResult {
        product_id: product.product_id.clone(),
        currency,
        coverage_tier: tier.key.clone(),
        member_brackets: brackets.iter().map(|b| b.key.clone()).collect(),
        rating_bracket: rating_bracket.key.clone(),
        age_multiplier: multiplier,
        base_premium: Money::whole(base, currency),
        line_items,
        add_on_total,
        chronic_condition_total: chronic_total,
        room_rent_adjustment: Money::whole(room_rent, currency),
        co_payment_adjustment: Money::whole(co_payment, currency),
        waiting_period_adjustment: Money::whole(waiting_period, currency),
        annual_premium: annual,
        tenure_years: request.tenure_years,
        tenure_discount_rate: tenure.discount_rate,
        tenure_discount_amount: Money::whole(tenure.discount_amount, currency),
        final_premium: Money::whole(tenure.total, currency),
        per_year_premium: Money::whole(tenure.per_year, currency),
        warnings,
    })
}

fn base_premium(product: &ProductRates, tier: &str, brackets: &[&AgeBracket]) -> Result<Decimal, RatingError> {
    let premiums = brackets
        .iter()
        .map(|bracket| {
            product
                .base_premium(tier, &bracket.key)
                .ok_or_else(|| RatingError::MissingRate {
                    tier: tier.to_string(),
                    bracket: bracket.key.clone(),
                })
        })
        .collect::<Result<Vec<Decimal>, RatingError>>()?;

    product
        .member_aggregation
        .combine(&premiums)
        .map(round_whole)
        .ok_or(RatingError::NoInsuredMembers)
}

/// Yields each id once, keeping first-seen order
fn distinct(ids: &[String]) -> impl Iterator<Item = &String> {
    let mut seen = HashSet::new();
    ids.iter().filter(move |id| seen.insert(id.as_str()))
}

fn price_add_ons(
    selected: &[String],
    table: &BTreeMap<String, TierCosts>,
    kind: LineItemKind,
    tier: &str,
    multiplier: Decimal,
    currency: Currency,
    line_items: &mut Vec<LineItem>,
) -> Result<(), RatingError> {
    for id in distinct(selected) {
        let unit_cost = table
            .get(id)
            .and_then(|costs| costs.get(tier))
            .copied()
            .ok_or_else(|| match kind {
                LineItemKind::Rider => RatingError::UnknownRiderId(id.clone()),
                _ => RatingError::UnknownFeatureId(id.clone()),
            })?;

        line_items.push(LineItem {
            kind,
            id: id.clone(),
            unit_cost,
            multiplier,
            amount: Money::whole(unit_cost * multiplier, currency),
        });
    }
    Ok(())
}

fn price_chronic_conditions(
    request: &RatingRequest,
    product: &ProductRates,
    tier: &str,
    currency: Currency,
    line_items: &mut Vec<LineItem>,
) -> Result<(), RatingError> {
    let mut selected = distinct(&request.chronic_conditions).peekable();
    let Some(first) = selected.peek() else {
        return Ok(());
    };
    let rules = product
        .chronic_conditions
        .as_ref()
        .ok_or_else(|| RatingError::UnknownConditionId((*first).clone()))?;

    for (position, id) in selected.enumerate() {
        if !rules.conditions.contains(id) {
            return Err(RatingError::UnknownConditionId(id.clone()));
        }
        let unit_cost = rules
            .pricing
            .cost_at(tier, position)
            .ok_or_else(|| RatingError::UnknownConditionId(id.clone()))?;

        line_items.push(LineItem {
            kind: LineItemKind::ChronicCondition,
            id: id.clone(),
            unit_cost,
            multiplier: Decimal::ONE,
            amount: Money::whole(unit_cost, currency),
        });
    }
    Ok(())
}

fn room_rent_adjustment(
    product: &ProductRates,
    selection: Option<&RoomRentSelection>,
    base: Decimal,
) -> Result<Decimal, RatingError> {
    let Some(selection) = selection else {
        return Ok(Decimal::ZERO);
    };
    let rules = &product.room_rent;

    if let Some(category) = &selection.category {
        let factor = rules
            .surcharge_factors
            .get(category)
            .ok_or_else(|| RatingError::UnknownRoomCategory(category.clone()))?;
        if *category != rules.default_category {
            return Ok(round_whole(base * factor));
        }
    }

    if let Some(cap) = selection.daily_cap {
        if cap < Decimal::ZERO {
            return Err(RatingError::selection("room_rent.daily_cap", format!("{} is negative", cap)));
        }
        if let Some(default_cap) = rules.default_daily_cap {
            if cap > default_cap {
                return Ok(round_whole(base * rules.cap_excess_rate));
            }
        }
    }

    Ok(Decimal::ZERO)
}

fn co_payment_adjustment(product: &ProductRates, request: &RatingRequest, base: Decimal) -> Result<Decimal, RatingError> {
    let Some(co_payment) = request.co_payment.as_ref().or(product.default_co_payment.as_ref()) else {
        return Ok(Decimal::ZERO);
    };
    co_payment
        .validate()
        .map_err(|detail| RatingError::selection("co_payment", detail))?;

    let reduction = match co_payment.kind {
        CoPaymentKind::None => Decimal::ZERO,
        CoPaymentKind::Percent => base * co_payment.value / dec!(100),
        CoPaymentKind::Fixed => co_payment.value,
    };
    Ok(-round_whole(reduction))
}

/// Linear proxy: each 30 days of reduction costs `unit_rate` of the base premium.
/// Not an actuarial calculation.
fn waiting_period_adjustment(product: &ProductRates, days: u32, base: Decimal) -> Decimal {
    let effective_days = days.min(MAX_WAITING_PERIOD_DAYS);
    if effective_days == 0 {
        return Decimal::ZERO;
    }
    round_whole(base * Decimal::from(effective_days) / dec!(30) * product.waiting_period_unit_rate)
}

struct TenureOutcome {
    discount_rate: Rate,
    discount_amount: Decimal,
    total: Decimal,
    per_year: Decimal,
}

fn apply_tenure(product: &ProductRates, years: u32, annual: Decimal) -> TenureOutcome {
    if years <= 1 {
        return TenureOutcome {
            discount_rate: Rate::zero(),
            discount_amount: Decimal::ZERO,
            total: annual,
            per_year: annual,
        };
    }

    let discount_rate = product.tenure.discount_for(years);
    let undiscounted = annual * Decimal::from(years);
    let total = round_whole(undiscounted * discount_rate.complement());

    TenureOutcome {
        discount_rate,
        discount_amount: undiscounted - total,
        total,
        per_year: round_whole(total / Decimal::from(years)),
    }
}
