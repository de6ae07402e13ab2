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

//! # rule-engine
//!
//! `rule-engine` maintains an in-memory, per-cell index of declarative rules
//! for a multi-tenant data platform, matches a continuous event stream
//! against it, and dispatches the resulting actions to an external worker
//! pool. A second, control-plane event stream keeps the index current as
//! rules, boxes, and cells change.
//!
//! Typical usage is API-first and centered on [`RuleEngine`]: construct it
//! once at startup with the collaborator handles ([`EntityStore`],
//! [`EventPublisher`], [`EventSubscriber`], [`CellLockManager`],
//! [`ActionSink`], optionally a [`TimerEventSink`]), feed data-plane events
//! through [`RuleEngine::judge`], and let the embedded subscriber apply
//! control events. Internal modules are organized by domain layer to keep
//! behavior ownership explicit.
//!
//! ## Internal architecture map
//!
//! - API facade: outward [`RuleEngine`] surface and process lifecycle
//! - Control plane: rule/box index ownership, registration orchestration,
//!   startup load, and the broker subscriber
//! - Matching: rule/event match policy and service-URL resolution
//! - Data plane: event dispatch and action submission
//! - Runtime: dedicated subscriber-loop runtime boundary
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events/spans and does not unconditionally initialize a
//! global subscriber. Binaries and tests are responsible for one-time
//! `tracing_subscriber` initialization at process boundaries.

mod broker;
mod cell_lock;
mod config;
mod control_plane;
mod data_plane;
mod engine;
mod error;
mod event;
mod matching;
mod observability;
mod runtime;
mod store;
mod timer;
pub mod uri;

pub use broker::{BrokerError, EventPublisher, EventSubscriber};
pub use cell_lock::{CellLockManager, CellStatus};
pub use config::EngineConfig;
pub use data_plane::action::{ActionInfo, ActionSink, ActionTask};
pub use engine::RuleEngine;
pub use error::EngineError;
pub use event::{types as event_types, Event};
pub use store::{
    box_name_of, rule_name_of, BoxEntity, Cell, EntityStore, RuleEntity, StoreError, FIELD_ACTION,
    FIELD_BOX_NAME, FIELD_EXTERNAL, FIELD_INFO, FIELD_NAME, FIELD_OBJECT, FIELD_SCHEMA,
    FIELD_SUBJECT, FIELD_TARGET_URL, FIELD_TYPE,
};
pub use timer::{TimerEventSink, TimerRuleSpec};
