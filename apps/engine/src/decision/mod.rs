//! The decision engine: two independent selection strategies behind one
//! "pick a winner" contract.
//!
//! `DeterministicStrategy` ranks by computed net annual value from structured
//! earn rules; `HeuristicStrategy` scores free-text cashback signals and
//! feature matches. Callers choose by data availability — the scoring
//! formulas are never merged.

pub mod earn_rules;
pub mod heuristic;
pub mod orchestrator;
pub mod prompts;
pub mod ranking;
pub mod signals;
pub mod value;

use crate::decision::heuristic::HeuristicScore;
use crate::decision::value::ValueBreakdown;
use crate::models::{Card, SpendProfile};

/// Inputs common to both strategies for a single pick.
#[derive(Debug, Clone, Copy)]
pub struct PickContext<'a> {
    pub category: &'a str,
    pub spend: &'a SpendProfile,
    /// Feature names the user asked for (e.g. "Airport Lounge Access").
    pub requested_features: &'a [String],
}

/// A winning card with whatever supporting detail the strategy produced.
/// Exactly one of `breakdown` (deterministic) and `heuristics` (heuristic)
/// is populated.
#[derive(Debug, Clone)]
pub struct WinningPick {
    pub card: Card,
    pub breakdown: Option<ValueBreakdown>,
    pub explanation: String,
    pub heuristics: Option<HeuristicScore>,
}

/// Outcome of one selection. Constructed per request, never persisted.
#[derive(Debug, Clone)]
pub enum Selection {
    Winner(WinningPick),
    NoPick { reason: String },
}

/// The common contract over both selection strategies.
///
/// Implementations are pure and deterministic: same inputs, same winner.
pub trait SelectionStrategy: Send + Sync {
    /// Short tag for logs and diagnostics: "deterministic" or "heuristic".
    fn name(&self) -> &'static str;

    fn pick(&self, cards: &[Card], context: &PickContext<'_>) -> Selection;
}
