//! Prompt construction for the AI-assisted path.
//!
//! The prompt carries a strict single-line JSON output contract and a
//! trimmed candidate list: perk copy is whitespace-collapsed and truncated
//! to fixed character budgets so the request stays inside the completion
//! service's context comfortably.

use serde_json::json;

use crate::models::{Card, SpendProfile};

/// Character budget for a candidate's core perks.
pub const CORE_PERKS_BUDGET: usize = 360;
/// Character budget for secondary and extra perks, each.
pub const SIDE_PERKS_BUDGET: usize = 240;

/// Fixed task description and output contract.
const PROMPT_HEADER: &str = "You are a credit card advisor. Pick the single best card for this \
user from the candidate list below.\n\
Respond with EXACTLY one line of JSON and nothing else:\n\
{\"card_id\": <number or null>, \"reason\": \"<under 120 characters>\"}\n\
No markdown fences. No line breaks inside the JSON. \
Use null for card_id only if no candidate fits.";

/// Collapses all runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to `budget` characters, appending an ellipsis when trimmed.
/// Operates on char boundaries.
pub fn truncate_chars(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(budget).collect();
    truncated.push('…');
    truncated
}

fn trimmed_perks(text: &str, budget: usize) -> String {
    truncate_chars(&collapse_whitespace(text), budget)
}

/// Serializes the user profile and trimmed candidates into the instruction
/// sent to the completion service.
pub fn build_prompt(
    category: &str,
    income: f64,
    annual_fee_ok: bool,
    spend: &SpendProfile,
    requested_features: &[String],
    candidates: &[Card],
) -> String {
    let profile = json!({
        "category": category,
        "monthly_income_aed": income,
        "accepts_annual_fee": annual_fee_ok,
        "monthly_spend_aed": spend,
        "requested_features": requested_features,
    });

    let candidate_list: Vec<_> = candidates
        .iter()
        .map(|card| {
            json!({
                "card_id": card.id,
                "bank": card.bank_name,
                "product": card.product,
                "minimum_salary": card.minimum_salary,
                "annual_fee": card.annual_fee,
                "joining_fee": card.joining_fee,
                "value_metric": card.value_metric,
                "core_perks": trimmed_perks(&card.core_perks, CORE_PERKS_BUDGET),
                "secondary_perks": trimmed_perks(&card.secondary_perks, SIDE_PERKS_BUDGET),
                "extra_perks": trimmed_perks(&card.extra_perks, SIDE_PERKS_BUDGET),
            })
        })
        .collect();

    format!(
        "{PROMPT_HEADER}\n\nUSER PROFILE:\n{}\n\nCANDIDATE CARDS:\n{}",
        profile,
        serde_json::Value::Array(candidate_list)
    )
}
