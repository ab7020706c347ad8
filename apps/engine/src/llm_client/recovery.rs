//! Defensive extraction of `{card_id, reason}` from raw completion output.
//!
//! Models routinely wrap JSON in markdown fences, truncate it mid-string, or
//! emit literal newlines inside string values. Recovery is an ordered chain
//! of independent, total attempts — strict parse, sanitized re-parse, regex
//! salvage — each returning either a result or "could not recover", so the
//! orchestrator can log which tier succeeded.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::decision::prompts::collapse_whitespace;
use crate::llm_client::{truncate_detail, DETAIL_BUDGET};

static CARD_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""card_id"\s*:\s*(null|-?\d+)"#).unwrap());
/// Tolerates an unterminated reason string: captures up to the closing quote
/// or the end of input.
static REASON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""reason"\s*:\s*"([^"]*)"#).unwrap());

/// The service's answer: which card (if any) and why.
#[derive(Debug, Clone, Deserialize)]
pub struct AiPick {
    pub card_id: Option<i64>,
    #[serde(default)]
    pub reason: String,
}

/// Which recovery attempt produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryTier {
    Strict,
    Sanitized,
    Salvage,
}

impl RecoveryTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryTier::Strict => "strict",
            RecoveryTier::Sanitized => "sanitized",
            RecoveryTier::Salvage => "salvage",
        }
    }
}

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("could not recover a card_id from the AI response: {snippet}")]
    Unrecoverable { snippet: String },
}

/// Removes markdown code-fence markers anywhere in the text.
fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "")
}

/// Replaces raw newlines and carriage returns occurring *inside* JSON string
/// literals with a single space, tracking string and escape state character
/// by character. Text outside string literals is left untouched.
fn sanitize_string_newlines(fragment: &str) -> String {
    let mut sanitized = String::with_capacity(fragment.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut just_replaced = false;

    for c in fragment.chars() {
        if in_string && (c == '\n' || c == '\r') {
            // A lone backslash right before the newline would be left as an
            // invalid escape; drop it with the newline.
            if escaped {
                sanitized.pop();
                escaped = false;
            }
            if !just_replaced {
                sanitized.push(' ');
                just_replaced = true;
            }
            continue;
        }
        just_replaced = false;

        if escaped {
            escaped = false;
        } else if in_string && c == '\\' {
            escaped = true;
        } else if c == '"' {
            in_string = !in_string;
        }
        sanitized.push(c);
    }
    sanitized
}

/// Runs the recovery chain over raw completion output.
///
/// Succeeds as soon as one tier yields a pick; salvage requires at least a
/// `card_id` token (reason defaults to empty). Exhaustion is an explicit
/// error carrying a truncated excerpt of the raw text.
pub fn recover(raw: &str) -> Result<(AiPick, RecoveryTier), RecoveryError> {
    let stripped = strip_fences(raw);
    let trimmed = stripped.trim();

    if let Ok(pick) = serde_json::from_str::<AiPick>(trimmed) {
        debug!(tier = RecoveryTier::Strict.as_str(), "AI response recovered");
        return Ok((pick, RecoveryTier::Strict));
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            let sanitized = sanitize_string_newlines(&trimmed[start..=end]);
            if let Ok(pick) = serde_json::from_str::<AiPick>(&sanitized) {
                debug!(tier = RecoveryTier::Sanitized.as_str(), "AI response recovered");
                return Ok((pick, RecoveryTier::Sanitized));
            }
        }
    }

    if let Some(capture) = CARD_ID_RE.captures(trimmed) {
        // An integer token too large for i64 must not masquerade as an
        // explicit null pick.
        let card_id = match &capture[1] {
            "null" => None,
            digits => match digits.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    return Err(RecoveryError::Unrecoverable {
                        snippet: truncate_detail(raw, DETAIL_BUDGET),
                    })
                }
            },
        };
        let reason = REASON_RE
            .captures(trimmed)
            .map(|c| collapse_whitespace(&c[1]))
            .unwrap_or_default();
        debug!(tier = RecoveryTier::Salvage.as_str(), "AI response recovered");
        return Ok((AiPick { card_id, reason }, RecoveryTier::Salvage));
    }

    Err(RecoveryError::Unrecoverable {
        snippet: truncate_detail(raw, DETAIL_BUDGET),
    })
}
