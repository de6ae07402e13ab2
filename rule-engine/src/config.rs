//! Engine configuration options.

/// Tunables recognized by the engine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineConfig {
    /// Worker-thread count configured for the timer sink; zero leaves the
    /// sink detached even when one is supplied.
    pub timer_event_thread_num: usize,
    /// Ceiling on an event's rule-chain hop counter. An event whose
    /// advanced counter exceeds this value produces no actions.
    pub max_event_hop: u32,
    /// Broker topic carrying cell-control events.
    pub rule_topic_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timer_event_thread_num: 0,
            max_event_hop: 3,
            rule_topic_name: "rule-event".to_string(),
        }
    }
}
