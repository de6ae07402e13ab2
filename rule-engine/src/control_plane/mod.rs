//! Control-plane layer.
//!
//! Owns the rule and box indexes, the registration lifecycle that keeps
//! box refcounts exact, the startup load from the store, and the
//! subscriber applying control events. Mutations here are atomic under the
//! index locks; store reads always happen outside them, so a control event
//! is applied as an unregister/register pair rather than one held-lock
//! transaction.

pub(crate) mod loader;
pub(crate) mod registrar;
pub(crate) mod rule_table;
pub(crate) mod subscriber;
