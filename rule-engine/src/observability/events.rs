//! Canonical structured event names used across `rule-engine`.

// Dispatch events.
pub const JUDGE_SKIP_BULK_DELETION: &str = "judge_skip_bulk_deletion";
pub const JUDGE_INVALID_RULE_CHAIN: &str = "judge_invalid_rule_chain";
pub const ACTION_SUBMIT: &str = "action_submit";
pub const ACTION_SKIP_UNRESOLVED_BOX: &str = "action_skip_unresolved_box";
pub const EVENT_REPUBLISH: &str = "event_republish";
pub const EVENT_REPUBLISH_FAILED: &str = "event_republish_failed";

// Index and registration events.
pub const RULE_REGISTER_OK: &str = "rule_register_ok";
pub const RULE_REGISTER_FAILED: &str = "rule_register_failed";
pub const RULE_UNREGISTER_OK: &str = "rule_unregister_ok";
pub const RULE_UNREGISTER_MISS: &str = "rule_unregister_miss";
pub const BOX_UPDATE_APPLIED: &str = "box_update_applied";
pub const BOX_UPDATE_MISS: &str = "box_update_miss";
pub const CELL_PURGE: &str = "cell_purge";

// Control-plane subscriber events.
pub const CONTROL_EVENT_APPLIED: &str = "control_event_applied";
pub const CONTROL_EVENT_IGNORED: &str = "control_event_ignored";
pub const CONTROL_EVENT_FAILED: &str = "control_event_failed";
pub const SUBSCRIBER_START: &str = "subscriber_start";
pub const SUBSCRIBER_STOP: &str = "subscriber_stop";
pub const SUBSCRIBER_RECV_CLOSED: &str = "subscriber_recv_closed";

// Loader events.
pub const LOAD_START: &str = "load_start";
pub const LOAD_CELL_OK: &str = "load_cell_ok";
pub const LOAD_CELL_FAILED: &str = "load_cell_failed";
pub const LOAD_DONE: &str = "load_done";

// Lifecycle events.
pub const ENGINE_START: &str = "engine_start";
pub const ENGINE_SHUTDOWN: &str = "engine_shutdown";
pub const SUBSCRIBER_SHUTDOWN_FORCED: &str = "subscriber_shutdown_forced";
