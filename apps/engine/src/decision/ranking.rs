//! Deterministic ranking over computed value breakdowns, with a fixed
//! tie-break policy between the top two candidates.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use crate::decision::signals::SignalRules;
use crate::decision::value::{compute_card_value, ValueBreakdown};
use crate::decision::{PickContext, Selection, SelectionStrategy, WinningPick};
use crate::models::Card;

/// Two candidates within this many AED of net annual value are considered
/// near-equal and go through the tie-break chain.
pub const TIE_BREAK_MARGIN_AED: f64 = 200.0;

/// Returned when every filtered candidate lacks parseable earn rules.
pub const NO_COMPUTABLE_REASON: &str =
    "None of the matching cards carry structured earn rules yet. \
     Add earn rules to these cards in the catalog to enable value comparison.";

struct RankedCandidate {
    card: Card,
    breakdown: ValueBreakdown,
    feature_hits: usize,
}

/// Ranks `cards` by net annual value and applies the tie-break policy.
///
/// Cards without parseable earn rules are excluded (counted as skipped);
/// if nothing is computable the result is an explained no-pick telling the
/// catalog maintainer what is missing.
pub fn pick_best_card_deterministic(
    cards: &[Card],
    context: &PickContext<'_>,
    rules: &SignalRules,
) -> Selection {
    let requested: HashSet<String> = context
        .requested_features
        .iter()
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect();

    let mut skipped = 0usize;
    let mut ranked: Vec<RankedCandidate> = cards
        .iter()
        .filter_map(|card| match compute_card_value(card, context.spend) {
            Some(breakdown) => {
                let detected = rules.detect_features(&card.perk_text());
                let feature_hits = detected
                    .iter()
                    .filter(|f| requested.contains(&f.to_lowercase()))
                    .count();
                Some(RankedCandidate {
                    card: card.clone(),
                    breakdown,
                    feature_hits,
                })
            }
            None => {
                skipped += 1;
                None
            }
        })
        .collect();

    if ranked.is_empty() {
        debug!(skipped, "no computable candidates");
        return Selection::NoPick {
            reason: NO_COMPUTABLE_REASON.to_string(),
        };
    }

    // Stable sort keeps catalog order among exact equals, so repeated
    // invocations agree.
    ranked.sort_by(|a, b| {
        b.breakdown
            .net_annual_value_aed
            .partial_cmp(&a.breakdown.net_annual_value_aed)
            .unwrap_or(Ordering::Equal)
    });

    let mut winner_index = 0;
    let mut tie_break_note = String::new();
    if ranked.len() > 1 {
        let margin =
            ranked[0].breakdown.net_annual_value_aed - ranked[1].breakdown.net_annual_value_aed;
        if margin <= TIE_BREAK_MARGIN_AED {
            if let Some(note) = tie_break(&ranked[0], &ranked[1]) {
                winner_index = 1;
                tie_break_note = note;
            }
        }
    }

    let chosen = &ranked[winner_index];
    debug!(
        card_id = chosen.card.id,
        net_annual_value = chosen.breakdown.net_annual_value_aed,
        skipped,
        tie_break = winner_index == 1,
        "deterministic winner"
    );

    let explanation = build_explanation(chosen, &tie_break_note);
    Selection::Winner(WinningPick {
        card: chosen.card.clone(),
        breakdown: Some(chosen.breakdown),
        explanation,
        heuristics: None,
    })
}

/// Decides whether the runner-up displaces the provisional winner.
///
/// Applied only between the current top two, in order: more requested
/// features, then lower annual fee, then higher unit value. Returns a note
/// for the explanation when the runner-up wins.
fn tie_break(top: &RankedCandidate, runner_up: &RankedCandidate) -> Option<String> {
    match runner_up.feature_hits.cmp(&top.feature_hits) {
        Ordering::Greater => {
            return Some(format!(
                "it matches {} of your requested perks",
                runner_up.feature_hits
            ));
        }
        Ordering::Less => return None,
        Ordering::Equal => {}
    }
    match runner_up
        .card
        .annual_fee
        .partial_cmp(&top.card.annual_fee)
        .unwrap_or(Ordering::Equal)
    {
        Ordering::Less => {
            return Some(format!(
                "it charges a lower annual fee (AED {:.2})",
                runner_up.card.annual_fee
            ));
        }
        Ordering::Greater => return None,
        Ordering::Equal => {}
    }
    match runner_up
        .breakdown
        .unit_value_aed
        .partial_cmp(&top.breakdown.unit_value_aed)
        .unwrap_or(Ordering::Equal)
    {
        Ordering::Greater => Some("each reward unit is worth more".to_string()),
        _ => None,
    }
}

fn build_explanation(chosen: &RankedCandidate, tie_break_note: &str) -> String {
    let mut explanation = format!(
        "{} nets AED {:.2} per year after fees (AED {:.2} in the first year).",
        chosen.card.product,
        chosen.breakdown.net_annual_value_aed,
        chosen.breakdown.net_first_year_value_aed
    );
    if !tie_break_note.is_empty() {
        explanation.push_str(&format!(
            " Chosen over a near-equal alternative because {tie_break_note}."
        ));
    }
    explanation
}

/// Earn-rule based strategy: the primary path whenever structured rules exist.
pub struct DeterministicStrategy {
    rules: SignalRules,
}

impl DeterministicStrategy {
    pub fn new(rules: SignalRules) -> Self {
        Self { rules }
    }
}

impl Default for DeterministicStrategy {
    fn default() -> Self {
        Self::new(SignalRules::default())
    }
}

impl SelectionStrategy for DeterministicStrategy {
    fn name(&self) -> &'static str {
        "deterministic"
    }

    fn pick(&self, cards: &[Card], context: &PickContext<'_>) -> Selection {
        pick_best_card_deterministic(cards, context, &self.rules)
    }
}
