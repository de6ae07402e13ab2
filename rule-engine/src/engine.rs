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

//! Engine facade and process-wide lifecycle.

use crate::broker::{EventPublisher, EventSubscriber};
use crate::cell_lock::CellLockManager;
use crate::config::EngineConfig;
use crate::control_plane::loader;
use crate::control_plane::registrar::RuleRegistrar;
use crate::control_plane::rule_table::RuleTable;
use crate::control_plane::subscriber::ControlPlaneSubscriber;
use crate::data_plane::action::ActionSink;
use crate::data_plane::dispatcher::Dispatcher;
use crate::error::EngineError;
use crate::event::Event;
use crate::observability::events;
use crate::runtime::subscriber_runtime;
use crate::store::{
    Cell, EntityStore, FIELD_ACTION, FIELD_BOX_NAME, FIELD_EXTERNAL, FIELD_INFO, FIELD_NAME,
    FIELD_OBJECT, FIELD_SCHEMA, FIELD_SUBJECT, FIELD_TARGET_URL, FIELD_TYPE,
};
use crate::timer::TimerEventSink;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{info, warn};

const COMPONENT: &str = "engine";

/// How long shutdown waits for the subscriber loop to drain before
/// abandoning its thread.
const SUBSCRIBER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

lazy_static! {
    static ref INSTANCE: Mutex<Option<Arc<RuleEngine>>> = Mutex::new(None);
}

/// The rule engine: authoritative in-memory rule/box index, matcher,
/// dispatcher, and control-plane subscriber behind one handle.
///
/// Construct with [`RuleEngine::start`] (or [`RuleEngine::init`] for the
/// process-wide instance). Startup loads the index from the store and
/// spawns the subscriber loop on its own runtime thread; [`shutdown`]
/// closes the publisher, detaches the timer sink, and drains the
/// subscriber.
///
/// [`shutdown`]: RuleEngine::shutdown
pub struct RuleEngine {
    table: Arc<RuleTable>,
    subscriber: Arc<ControlPlaneSubscriber>,
    dispatcher: Dispatcher,
    publisher: Arc<dyn EventPublisher>,
    timer: Option<Arc<dyn TimerEventSink>>,
    shutdown_tx: watch::Sender<bool>,
    subscriber_done: Mutex<Option<oneshot::Receiver<()>>>,
}

impl RuleEngine {
    /// Builds and starts an engine: loads the index from the store, spawns
    /// the control-plane subscriber, and wires the dispatcher.
    ///
    /// The timer sink is attached only when the configured timer thread
    /// count is positive.
    pub async fn start(
        config: EngineConfig,
        store: Arc<dyn EntityStore>,
        cell_locks: Arc<dyn CellLockManager>,
        actions: Arc<dyn ActionSink>,
        publisher: Arc<dyn EventPublisher>,
        subscription: Arc<dyn EventSubscriber>,
        timer: Option<Arc<dyn TimerEventSink>>,
    ) -> Result<Arc<Self>, EngineError> {
        let timer = if config.timer_event_thread_num > 0 {
            timer
        } else {
            None
        };

        let table = Arc::new(RuleTable::new());
        let registrar = Arc::new(RuleRegistrar::new(
            table.clone(),
            store.clone(),
            timer.clone(),
        ));
        loader::load_all(store.as_ref(), &registrar).await?;

        let subscriber = Arc::new(ControlPlaneSubscriber::new(
            table.clone(),
            registrar,
            store.clone(),
            cell_locks.clone(),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (done_tx, done_rx) = oneshot::channel();
        {
            let subscriber = subscriber.clone();
            subscriber_runtime::spawn_subscriber_loop(move || async move {
                subscriber.run(subscription, shutdown_rx).await;
                let _ = done_tx.send(());
            });
        }

        let dispatcher = Dispatcher::new(
            table.clone(),
            store,
            cell_locks,
            actions,
            publisher.clone(),
            config.max_event_hop,
        );

        info!(
            event = events::ENGINE_START,
            component = COMPONENT,
            rule_topic = config.rule_topic_name.as_str(),
            max_event_hop = config.max_event_hop,
            timer_attached = timer.is_some(),
            "rule engine started"
        );

        Ok(Arc::new(Self {
            table,
            subscriber,
            dispatcher,
            publisher,
            timer,
            shutdown_tx,
            subscriber_done: Mutex::new(Some(done_rx)),
        }))
    }

    /// Starts the process-wide instance. Initialization is not meant to be
    /// called concurrently; callers serialize via startup ordering.
    pub async fn init(
        config: EngineConfig,
        store: Arc<dyn EntityStore>,
        cell_locks: Arc<dyn CellLockManager>,
        actions: Arc<dyn ActionSink>,
        publisher: Arc<dyn EventPublisher>,
        subscription: Arc<dyn EventSubscriber>,
        timer: Option<Arc<dyn TimerEventSink>>,
    ) -> Result<Arc<Self>, EngineError> {
        if INSTANCE.lock().is_some() {
            return Err(EngineError::AlreadyInitialized);
        }
        let engine = Self::start(
            config,
            store,
            cell_locks,
            actions,
            publisher,
            subscription,
            timer,
        )
        .await?;
        *INSTANCE.lock() = Some(engine.clone());
        Ok(engine)
    }

    /// The process-wide instance, when one is initialized.
    pub fn instance() -> Option<Arc<Self>> {
        INSTANCE.lock().clone()
    }

    /// Matches one inbound event against its cell's rules and queues the
    /// resulting actions. Returns once submissions are queued.
    pub async fn judge(&self, event: Event) {
        self.dispatcher.judge(event).await;
    }

    /// Applies one control event to the index; the flag reports success
    /// and is informational only.
    pub async fn handle_control_event(&self, event: &Event) -> bool {
        self.subscriber.handle_control_event(event).await
    }

    /// Debug/inspection document of one cell's indexed rules and boxes,
    /// plus the timer sink's listing when attached.
    pub fn rules_snapshot(&self, cell: &Cell) -> Value {
        let snapshot = self.table.snapshot_cell(&cell.id);

        let rules: Vec<Value> = snapshot
            .rules
            .iter()
            .map(|(rule, linked_box)| {
                let mut doc = Map::new();
                doc.insert(FIELD_EXTERNAL.to_string(), json!(rule.external));
                doc.insert(FIELD_SUBJECT.to_string(), json!(rule.subject));
                doc.insert(FIELD_TYPE.to_string(), json!(rule.event_type));
                doc.insert(FIELD_OBJECT.to_string(), json!(rule.object));
                doc.insert(FIELD_INFO.to_string(), json!(rule.info));
                doc.insert(FIELD_ACTION.to_string(), json!(rule.action));
                doc.insert(FIELD_TARGET_URL.to_string(), json!(rule.service));
                if let Some(bx) = linked_box {
                    doc.insert(FIELD_SCHEMA.to_string(), json!(bx.schema));
                    doc.insert(FIELD_BOX_NAME.to_string(), json!(bx.name));
                }
                doc.insert(FIELD_NAME.to_string(), json!(rule.name));
                Value::Object(doc)
            })
            .collect();

        let boxes: Vec<Value> = snapshot
            .boxes
            .iter()
            .map(|bx| {
                let mut doc = Map::new();
                doc.insert(FIELD_NAME.to_string(), json!(bx.name));
                doc.insert(FIELD_SCHEMA.to_string(), json!(bx.schema));
                doc.insert("id".to_string(), json!(bx.id));
                Value::Object(doc)
            })
            .collect();

        let mut root = Map::new();
        root.insert("rules".to_string(), Value::Array(rules));
        root.insert("boxes".to_string(), Value::Array(boxes));
        if let Some(timer) = &self.timer {
            root.insert("timers".to_string(), timer.timer_list(&cell.id));
        }
        Value::Object(root)
    }

    /// Shuts the engine down: closes the publisher, stops the timer sink,
    /// and drains the subscriber for up to one second before abandoning
    /// its thread. Clears the process-wide instance when it is this one.
    pub async fn shutdown(&self) {
        self.publisher.close().await;

        if let Some(timer) = &self.timer {
            timer.shutdown();
        }

        let _ = self.shutdown_tx.send(true);
        let done = self.subscriber_done.lock().take();
        if let Some(done) = done {
            if tokio::time::timeout(SUBSCRIBER_DRAIN_TIMEOUT, done)
                .await
                .is_err()
            {
                warn!(
                    event = events::SUBSCRIBER_SHUTDOWN_FORCED,
                    component = COMPONENT,
                    "subscriber did not drain in time; abandoning its thread"
                );
            }
        }

        let mut slot = INSTANCE.lock();
        if slot
            .as_ref()
            .is_some_and(|engine| std::ptr::eq(Arc::as_ptr(engine), self))
        {
            *slot = None;
        }
        info!(
            event = events::ENGINE_SHUTDOWN,
            component = COMPONENT,
            "rule engine stopped"
        );
    }
}
