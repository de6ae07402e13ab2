//! Engine-level error types.

use crate::store::StoreError;
use entity_key::KeyParseError;
use thiserror::Error;

/// Failures surfaced by registration, control-event handling, and lifecycle
/// operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Key(#[from] KeyParseError),
    #[error("control event carries no {0} fragment")]
    MissingFragment(&'static str),
    #[error("rule {0:?} has no action")]
    MissingAction(String),
    #[error("rule {rule:?} references unresolvable box {box_name:?}")]
    UnresolvedBox { rule: String, box_name: String },
    #[error("engine is already initialized")]
    AlreadyInitialized,
}
