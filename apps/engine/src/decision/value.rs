//! Deterministic monetary valuation of a card against a spend profile.

use serde::{Deserialize, Serialize};

use crate::decision::earn_rules::parse_earn_rules;
use crate::models::{Card, SpendProfile};

/// Rounds to 2 decimal places for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Annualized value figures for one card, all in AED except `annual_units`.
///
/// Invariants (on the rounded figures):
/// `net_annual_value_aed == annual_reward_value_aed - annual_fees_aed` and
/// `net_first_year_value_aed == net_annual_value_aed - joining_fee_aed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueBreakdown {
    pub annual_units: f64,
    pub unit_value_aed: f64,
    pub annual_reward_value_aed: f64,
    pub annual_fees_aed: f64,
    pub joining_fee_aed: f64,
    pub net_annual_value_aed: f64,
    pub net_first_year_value_aed: f64,
}

/// Monetary value of one reward unit for this card.
///
/// Prefers an explicit positive `unit_value`; a cashback-style reward metric
/// implies 1 AED per unit; anything else resolves to 0, which makes the
/// reward value zero rather than an error.
fn resolve_unit_value(card: &Card) -> f64 {
    if let Some(value) = card.unit_value {
        if value > 0.0 {
            return value;
        }
    }
    if card.reward_metric_text().to_lowercase().contains("cashback") {
        1.0
    } else {
        0.0
    }
}

/// Computes the annual value breakdown for `card` against `spend`.
///
/// Returns `None` when the card carries no parseable earn rules — such cards
/// are excluded from deterministic ranking.
pub fn compute_card_value(card: &Card, spend: &SpendProfile) -> Option<ValueBreakdown> {
    let schedule = parse_earn_rules(card.earn_rules.as_deref().unwrap_or(&[]))?;
    let unit_value = resolve_unit_value(card);

    let monthly_units: f64 = spend
        .buckets()
        .iter()
        .map(|(bucket, amount)| amount * schedule.rate_for(bucket))
        .sum();
    let annual_units = monthly_units * 12.0;

    let annual_reward_value = round2(annual_units * unit_value);
    let annual_fees = round2(card.annual_fee + card.mandatory_extra_fees.unwrap_or(0.0));
    let joining_fee = round2(card.joining_fee);
    let net_annual_value = round2(annual_reward_value - annual_fees);
    let net_first_year_value = round2(net_annual_value - joining_fee);

    Some(ValueBreakdown {
        annual_units: round2(annual_units),
        unit_value_aed: round2(unit_value),
        annual_reward_value_aed: annual_reward_value,
        annual_fees_aed: annual_fees,
        joining_fee_aed: joining_fee,
        net_annual_value_aed: net_annual_value,
        net_first_year_value_aed: net_first_year_value,
    })
}
