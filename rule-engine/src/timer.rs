/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Timer-sink contract for timer-driven rules.
//!
//! The timer manager is a sibling component; when attached, it mirrors the
//! engine's register/unregister traffic so it can fire `timer.periodic` and
//! `timer.oneshot` events for the rules that want them.

/// The rule attributes the timer sink tracks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimerRuleSpec {
    pub name: String,
    pub subject: Option<String>,
    pub event_type: Option<String>,
    pub object: Option<String>,
    pub info: Option<String>,
    pub cell_id: String,
    pub box_id: Option<String>,
}

/// Pluggable sink notified on every rule registration change.
pub trait TimerEventSink: Send + Sync {
    fn register(&self, spec: TimerRuleSpec);

    fn unregister(&self, spec: TimerRuleSpec);

    /// Debug listing of the sink's timers for one cell.
    fn timer_list(&self, cell_id: &str) -> serde_json::Value;

    fn shutdown(&self);
}
