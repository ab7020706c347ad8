//! Keyword-heuristic scoring: the fallback path when structured earn rules
//! are wholly absent from a catalog segment.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::decision::signals::{CashbackRates, SignalRules};
use crate::decision::{PickContext, Selection, SelectionStrategy, WinningPick};
use crate::models::{Card, SpendProfile};

/// Points added per requested feature the card supports.
pub const FEATURE_BONUS: f64 = 15.0;

/// Score detail for one card under the heuristic strategy. Serialized as-is
/// into the boundary result when this strategy wins.
#[derive(Debug, Clone, Serialize)]
pub struct HeuristicScore {
    pub score: f64,
    pub cashback_value: f64,
    pub matched_features: Vec<String>,
    pub available_features: Vec<String>,
}

/// Estimates a monthly cashback value from extracted rates.
///
/// Travel requests value travel+foreign spend at the travel rate (general
/// rate as fallback); shopping values retail spend; cashback/rewards and
/// everything else value total spend at the best rate seen.
pub fn estimate_cashback_value(
    category: &str,
    spend: &SpendProfile,
    rates: &CashbackRates,
) -> f64 {
    let category_key = category.trim().to_lowercase();

    if category_key == "travel" {
        let base_spend = spend.travel + spend.foreign;
        if rates.travel > 0.0 {
            return base_spend * (rates.travel / 100.0);
        }
        if rates.general > 0.0 {
            return base_spend * (rates.general / 100.0);
        }
        return 0.0;
    }

    let base_spend = if category_key == "shopping" {
        spend.retail
    } else {
        spend.total()
    };

    let best_rate = rates.best();
    if best_rate <= 0.0 {
        return 0.0;
    }
    base_spend * (best_rate / 100.0)
}

/// Scores one card from its free-text signals.
///
/// A card with no cashback signal falls back to `minimum_salary / 1000`
/// plus the feature bonus, so cards with a salary tier never score flat zero.
pub fn score_card(
    card: &Card,
    category: &str,
    spend: &SpendProfile,
    selected_features: &[String],
    rules: &SignalRules,
) -> HeuristicScore {
    let text_block = card.perk_text();
    let rates = rules.extract_cashback_rates(&text_block);
    let cashback_value = estimate_cashback_value(category, spend, &rates);

    let available: HashSet<String> = rules.detect_features(&text_block);
    let requested: HashSet<String> = selected_features
        .iter()
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect();
    let mut matched: Vec<String> = available
        .iter()
        .filter(|f| requested.contains(&f.to_lowercase()))
        .cloned()
        .collect();
    matched.sort();
    let feature_bonus = matched.len() as f64 * FEATURE_BONUS;

    let score = if cashback_value > 0.0 {
        cashback_value + feature_bonus
    } else {
        card.minimum_salary / 1000.0 + feature_bonus
    };

    let mut available: Vec<String> = available.into_iter().collect();
    available.sort();

    HeuristicScore {
        score,
        cashback_value,
        matched_features: matched,
        available_features: available,
    }
}

fn build_explanation(card: &Card, score: &HeuristicScore) -> String {
    let mut explanation = format!("{} scores highest on your profile", card.product);
    if score.cashback_value > 0.0 {
        explanation.push_str(&format!(
            ", with an estimated AED {:.2} monthly cashback",
            score.cashback_value
        ));
    }
    if !score.matched_features.is_empty() {
        explanation.push_str(&format!(
            ", and it covers {}",
            score.matched_features.join(", ")
        ));
    }
    explanation.push('.');
    explanation
}

/// Free-text scoring strategy. No tie-break beyond score order.
pub struct HeuristicStrategy {
    rules: SignalRules,
}

impl HeuristicStrategy {
    pub fn new(rules: SignalRules) -> Self {
        Self { rules }
    }
}

impl Default for HeuristicStrategy {
    fn default() -> Self {
        Self::new(SignalRules::default())
    }
}

impl SelectionStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn pick(&self, cards: &[Card], context: &PickContext<'_>) -> Selection {
        let mut scored: Vec<(HeuristicScore, &Card)> = cards
            .iter()
            .map(|card| {
                (
                    score_card(
                        card,
                        context.category,
                        context.spend,
                        context.requested_features,
                        &self.rules,
                    ),
                    card,
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.score
                .partial_cmp(&a.0.score)
                .unwrap_or(Ordering::Equal)
        });

        match scored.first() {
            Some((score, card)) => {
                debug!(card_id = card.id, score = score.score, "heuristic winner");
                Selection::Winner(WinningPick {
                    card: (*card).clone(),
                    breakdown: None,
                    explanation: build_explanation(card, score),
                    heuristics: Some(score.clone()),
                })
            }
            None => Selection::NoPick {
                reason: "No cards match that category or partner yet.".to_string(),
            },
        }
    }
}
