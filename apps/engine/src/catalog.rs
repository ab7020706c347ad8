//! The card catalog collaborator seam.
//!
//! Storage, schema, and import/export live outside this crate; the engine
//! only ever reads a filtered card list through `CardCatalog`.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Card;

/// Category/sub-category/program filter. Empty fields constrain nothing.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub category: String,
    pub sub_category: String,
    pub program: String,
}

impl CatalogFilter {
    pub fn matches(&self, card: &Card) -> bool {
        let field_matches =
            |filter: &str, value: &str| filter.is_empty() || filter == value;
        field_matches(&self.category, &card.card_category)
            && field_matches(&self.sub_category, &card.sub_category)
            && field_matches(&self.program, &card.program)
    }
}

/// Read-only card source. Implementations are provided by the embedding
/// application (database, cache, fixture file).
#[async_trait]
pub trait CardCatalog: Send + Sync {
    async fn fetch_cards(&self, filter: &CatalogFilter) -> Result<Vec<Card>>;
}

/// Simple in-process catalog over a fixed card list. Used by tests and by
/// embedders that load the catalog up front.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    cards: Vec<Card>,
}

impl InMemoryCatalog {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }
}

#[async_trait]
impl CardCatalog for InMemoryCatalog {
    async fn fetch_cards(&self, filter: &CatalogFilter) -> Result<Vec<Card>> {
        Ok(self
            .cards
            .iter()
            .filter(|card| filter.matches(card))
            .cloned()
            .collect())
    }
}
