//! Observability layer.
//!
//! Centralizes the structured event names and field keys used by `tracing`
//! call sites so log consumers can rely on a stable vocabulary.

pub(crate) mod events;
pub(crate) mod fields;
