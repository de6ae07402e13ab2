//! Matching layer.
//!
//! Owns the policy deciding whether an event triggers a rule and how a
//! matched rule's service URL resolves to absolute form. Both are pure over
//! the rule, the event, and the rule's resolved box view; the data plane
//! supplies that view under the index locks.

pub(crate) mod matcher;
pub(crate) mod service_resolution;
