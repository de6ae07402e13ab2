//! Action submission types handed to the external worker pool.

use crate::event::Event;
use crate::store::Cell;

/// Immutable description of one action a matched rule produced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionInfo {
    /// Action kind, e.g. `exec`, `relay`, `log`.
    pub action: String,
    /// Absolute target URL after scheme resolution, when the rule has one.
    pub service: Option<String>,
    pub event_id: String,
    /// Advanced hop counter the action's own events must carry.
    pub rule_chain: String,
}

/// One unit of work submitted for execution.
#[derive(Clone, Debug)]
pub struct ActionTask {
    pub cell: Cell,
    pub action: ActionInfo,
    pub event: Event,
}

/// Externally owned worker pool executing action tasks.
///
/// `submit` enqueues without blocking; tasks run concurrently with no
/// ordering guarantee across tasks.
pub trait ActionSink: Send + Sync {
    fn submit(&self, task: ActionTask);
}
