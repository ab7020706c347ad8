use thiserror::Error;

/// Engine-level error type.
///
/// Only collaborator I/O surfaces as `Err` from the orchestrator; every
/// domain-level failure (no candidates, uncomputable cards, AI transport or
/// parse trouble) folds into an explained-null `Recommendation` instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog error: {0}")]
    Catalog(#[from] anyhow::Error),
}
