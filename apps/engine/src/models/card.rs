//! Card records as supplied by the catalog collaborator. Read-only to the engine.

use serde::{Deserialize, Serialize};

/// One structured earn rule entry as stored in the catalog.
///
/// The rate can be given directly (`units_per_aed`) or as a
/// "units per X currency" pair (`units` / `per_aed`). Entries that resolve
/// to no positive rate are dropped silently by the parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EarnRuleSpec {
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units_per_aed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_aed: Option<f64>,
}

/// A credit card record from the catalog.
///
/// Monetary figures are in AED. Perk fields are unstructured promotional
/// copy; `earn_rules` is the structured alternative the deterministic path
/// requires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    #[serde(default)]
    pub card_category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub minimum_salary: f64,
    #[serde(default)]
    pub value_metric: String,
    #[serde(default)]
    pub value_calculation: String,
    #[serde(default)]
    pub annual_fee: f64,
    #[serde(default)]
    pub joining_fee: f64,
    #[serde(default)]
    pub extra_fees: String,
    #[serde(default)]
    pub core_perks: String,
    #[serde(default)]
    pub secondary_perks: String,
    #[serde(default)]
    pub extra_perks: String,
    #[serde(default)]
    pub card_type: String,
    #[serde(default)]
    pub current_offer: String,
    #[serde(default)]
    pub product_page: String,
    /// Structured earn rules. `None`/empty means the card is not
    /// deterministically computable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earn_rules: Option<Vec<EarnRuleSpec>>,
    /// Explicit reward unit name (e.g. "Skywards Miles", "Cashback").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_unit: Option<String>,
    /// Monetary value of one reward unit, when the catalog knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_value: Option<f64>,
    /// Unavoidable fees layered on top of the annual fee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory_extra_fees: Option<f64>,
}

impl Card {
    /// Concatenated free-text block used for keyword and rate extraction.
    pub fn perk_text(&self) -> String {
        [
            self.core_perks.as_str(),
            self.secondary_perks.as_str(),
            self.extra_perks.as_str(),
            self.card_type.as_str(),
            self.product.as_str(),
        ]
        .join(" ")
    }

    /// Text describing the reward unit, used to infer a unit value when the
    /// catalog carries none.
    pub fn reward_metric_text(&self) -> String {
        match &self.reward_unit {
            Some(unit) => format!("{} {}", unit, self.value_metric),
            None => self.value_metric.clone(),
        }
    }
}
