//! Perkly decision engine — recommends a credit card from a catalog given a
//! user's spend profile, income, fee tolerance, and desired perks.
//!
//! The engine is pure and synchronous apart from two seams: the read-only
//! [`catalog::CardCatalog`] collaborator and the single completion request in
//! [`llm_client`]. Web plumbing, catalog storage, and settings persistence
//! live in the embedding application.

pub mod catalog;
pub mod config;
pub mod decision;
pub mod errors;
pub mod llm_client;
pub mod models;

pub use catalog::{CardCatalog, CatalogFilter, InMemoryCatalog};
pub use config::AiSettings;
pub use decision::heuristic::{HeuristicScore, HeuristicStrategy};
pub use decision::orchestrator::{
    recommend, recommend_with_ai, RecommendRequest, Recommendation,
};
pub use decision::ranking::DeterministicStrategy;
pub use decision::{Selection, SelectionStrategy};
pub use errors::EngineError;
pub use models::{Card, EarnRuleSpec, SpendProfile};
