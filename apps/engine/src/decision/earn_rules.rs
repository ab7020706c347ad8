//! Earn rule parsing: structured catalog entries into a rate schedule, plus
//! the free-text auto-derivation used when repairing a catalog.

use std::collections::HashMap;

use tracing::debug;

use crate::decision::signals::SignalRules;
use crate::models::{Card, EarnRuleSpec};

/// Bucket aliases that set the default rate instead of a per-bucket rate.
const DEFAULT_ALIASES: [&str; 2] = ["default", "all"];

/// Parsed earn schedule: reward units earned per AED of spend.
///
/// Precedence: an explicit bucket rate always overrides the default; the
/// default applies to every bucket without one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EarnSchedule {
    pub default_rate: Option<f64>,
    pub bucket_rates: HashMap<String, f64>,
}

impl EarnSchedule {
    /// Rate applied to spend in `bucket`: explicit rate, else default, else 0.
    pub fn rate_for(&self, bucket: &str) -> f64 {
        self.bucket_rates
            .get(bucket)
            .copied()
            .or(self.default_rate)
            .unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.default_rate.is_none() && self.bucket_rates.is_empty()
    }
}

fn resolve_rate(spec: &EarnRuleSpec) -> Option<f64> {
    if let Some(rate) = spec.units_per_aed {
        return (rate > 0.0).then_some(rate);
    }
    match (spec.units, spec.per_aed) {
        (Some(units), Some(per)) if units > 0.0 && per > 0.0 => Some(units / per),
        _ => None,
    }
}

/// Parses a card's structured earn rules into a schedule.
///
/// Returns `None` when no entry resolves to a positive rate — the card is
/// then not deterministically computable and the caller must fall back or
/// skip it. Entries that fail to resolve are discarded silently.
pub fn parse_earn_rules(rules: &[EarnRuleSpec]) -> Option<EarnSchedule> {
    let mut schedule = EarnSchedule::default();
    for spec in rules {
        let Some(rate) = resolve_rate(spec) else {
            continue;
        };
        let bucket = spec.bucket.trim().to_lowercase();
        if bucket.is_empty() {
            continue;
        }
        if DEFAULT_ALIASES.contains(&bucket.as_str()) {
            schedule.default_rate = Some(rate);
        } else {
            schedule.bucket_rates.insert(bucket, rate);
        }
    }
    if schedule.is_empty() {
        None
    } else {
        Some(schedule)
    }
}

/// Derives earn rules from perk text, line by line.
///
/// Each line needs a rate (percentage cashback or units-per-currency) to
/// contribute; the keyword classifier decides which buckets it feeds, with
/// unclassified lines feeding the default bucket. The maximum rate per
/// bucket wins. No rate anywhere means no rules.
pub fn derive_earn_rules(text: &str, rules: &SignalRules) -> Vec<EarnRuleSpec> {
    let mut best: HashMap<String, f64> = HashMap::new();
    for line in text.to_lowercase().lines() {
        let Some(rate) = rules.extract_line_rate(line) else {
            continue;
        };
        let buckets = rules.classify_line_buckets(line);
        if buckets.is_empty() {
            let entry = best.entry("default".to_string()).or_insert(0.0);
            *entry = entry.max(rate);
        } else {
            for bucket in buckets {
                let entry = best.entry(bucket).or_insert(0.0);
                *entry = entry.max(rate);
            }
        }
    }

    let mut derived: Vec<EarnRuleSpec> = best
        .into_iter()
        .map(|(bucket, rate)| EarnRuleSpec {
            bucket,
            units_per_aed: Some(rate),
            ..EarnRuleSpec::default()
        })
        .collect();
    derived.sort_by(|a, b| a.bucket.cmp(&b.bucket));
    derived
}

/// Fills `card.earn_rules` from its perk text when the card has none.
///
/// Idempotent and non-destructive: cards that already carry rules are left
/// untouched, and a text that derives nothing leaves the field empty.
/// Returns whether the card was modified.
pub fn backfill_earn_rules(card: &mut Card, rules: &SignalRules) -> bool {
    if card.earn_rules.as_ref().is_some_and(|r| !r.is_empty()) {
        return false;
    }
    let derived = derive_earn_rules(&card.perk_text(), rules);
    if derived.is_empty() {
        return false;
    }
    debug!(card_id = card.id, rules = derived.len(), "derived earn rules from perk text");
    card.earn_rules = Some(derived);
    true
}
