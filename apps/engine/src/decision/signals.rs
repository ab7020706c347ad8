//! Keyword and pattern extraction over free-form perk text.
//!
//! Promotional copy is inherently messy, so everything here is heuristic:
//! pure case-insensitive substring matching for features, and per-line regex
//! matching for cashback percentages. The keyword tables live in
//! `SignalRules` so they can be tested and extended as data instead of logic.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// `5% cashback`, `3 % back`, `1.5% cashback` — percentage followed by a
/// cashback marker.
static CASHBACK_RATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%\s*(?:cashback|back)").unwrap());

/// `3 Skywards Miles per AED 1`, `2 points per 1 AED` — units earned per a
/// currency amount.
static UNITS_PER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)[^%\n]*?\bper\b[^0-9\n]*(\d+(?:\.\d+)?)").unwrap());

/// Maximum cashback rate seen per classification bucket. Percentages, not
/// fractions: "5% cashback" yields 5.0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CashbackRates {
    pub travel: f64,
    pub other: f64,
    pub general: f64,
}

impl CashbackRates {
    pub fn best(&self) -> f64 {
        self.travel.max(self.other).max(self.general)
    }
}

/// The keyword tables driving feature detection, cashback-line
/// classification, and earn-rule auto-derivation.
#[derive(Debug, Clone)]
pub struct SignalRules {
    /// feature name -> lowercase substrings that imply it.
    pub feature_keywords: Vec<(String, Vec<String>)>,
    /// A line containing any of these is a travel cashback line.
    pub travel_keywords: Vec<String>,
    /// A line containing any of these is an "all other spend" cashback line.
    pub other_spend_keywords: Vec<String>,
    /// bucket name -> lowercase substrings, for earn-rule auto-derivation.
    pub bucket_keywords: Vec<(String, Vec<String>)>,
}

fn table(entries: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
    entries
        .iter()
        .map(|(name, keywords)| {
            (
                name.to_string(),
                keywords.iter().map(|k| k.to_string()).collect(),
            )
        })
        .collect()
}

impl Default for SignalRules {
    fn default() -> Self {
        Self {
            feature_keywords: table(&[
                ("Cinema Offers", &["cinema", "movie", "vox", "roxy", "reel"]),
                ("Airport Lounge Access", &["lounge"]),
                ("Valet Parking", &["valet"]),
                ("Complementary Golf", &["golf"]),
                ("Metal Card", &["metal"]),
                (
                    "Airport Transfers",
                    &["airport transfer", "airport transfers", "careem"],
                ),
            ]),
            travel_keywords: [
                "flight",
                "flights",
                "hotel",
                "travel",
                "airline",
                "airlines",
                "booking",
                "cleartrip",
                "booking.com",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
            other_spend_keywords: [
                "all other",
                "all other domestic",
                "other spends",
                "other spend",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
            bucket_keywords: table(&[
                (
                    "travel",
                    &["flight", "hotel", "travel", "airline", "airfare", "booking"],
                ),
                (
                    "food_groceries",
                    &[
                        "grocery",
                        "groceries",
                        "supermarket",
                        "dining",
                        "restaurant",
                        "food",
                    ],
                ),
                ("utilities", &["utility", "utilities", "bill payment", "telecom"]),
                ("fuel", &["fuel", "petrol", "adnoc", "enoc", "eppco"]),
                ("government", &["government", "salik"]),
                ("real_estate", &["real estate", "rent", "property"]),
                (
                    "transportation",
                    &["transport", "taxi", "metro", "careem", "uber", "rta"],
                ),
                ("retail", &["retail", "shopping", "online", "e-commerce"]),
                (
                    "foreign",
                    &["foreign", "international", "overseas", "abroad", "fx"],
                ),
            ]),
        }
    }
}

impl SignalRules {
    /// Returns the feature names whose keywords occur anywhere in `text`.
    /// Pure substring match, case-insensitive, no word boundaries.
    pub fn detect_features(&self, text: &str) -> HashSet<String> {
        let haystack = text.to_lowercase();
        self.feature_keywords
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k.as_str())))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Scans `text` line by line for percentage-cashback mentions and keeps
    /// the maximum rate per bucket. Travel keywords take precedence over
    /// "other spend" keywords when a line carries both.
    pub fn extract_cashback_rates(&self, text: &str) -> CashbackRates {
        let mut rates = CashbackRates::default();
        for line in text.to_lowercase().lines() {
            for capture in CASHBACK_RATE_RE.captures_iter(line) {
                let Ok(rate) = capture[1].parse::<f64>() else {
                    continue;
                };
                if self.travel_keywords.iter().any(|k| line.contains(k.as_str())) {
                    rates.travel = rates.travel.max(rate);
                } else if self
                    .other_spend_keywords
                    .iter()
                    .any(|k| line.contains(k.as_str()))
                {
                    rates.other = rates.other.max(rate);
                } else {
                    rates.general = rates.general.max(rate);
                }
            }
        }
        rates
    }

    /// Extracts an earn rate (reward units per AED) from one line of perk
    /// text, if it mentions one. Percentage cashback converts to a fraction
    /// so that unit value 1 reproduces the percentage.
    pub fn extract_line_rate(&self, line: &str) -> Option<f64> {
        if let Some(capture) = CASHBACK_RATE_RE.captures(line) {
            let pct: f64 = capture[1].parse().ok()?;
            return (pct > 0.0).then_some(pct / 100.0);
        }
        if let Some(capture) = UNITS_PER_RE.captures(line) {
            let units: f64 = capture[1].parse().ok()?;
            let per: f64 = capture[2].parse().ok()?;
            if units > 0.0 && per > 0.0 {
                return Some(units / per);
            }
        }
        None
    }

    /// Names the spend buckets a perk-text line talks about. Empty result
    /// means the line contributes to the default bucket.
    pub fn classify_line_buckets(&self, line: &str) -> Vec<String> {
        self.bucket_keywords
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| line.contains(k.as_str())))
            .map(|(bucket, _)| bucket.clone())
            .collect()
    }
}
