//! Control-plane subscriber applying rule lifecycle events to the indexes.

use crate::broker::EventSubscriber;
use crate::cell_lock::{CellLockManager, CellStatus};
use crate::control_plane::registrar::RuleRegistrar;
use crate::control_plane::rule_table::RuleTable;
use crate::error::EngineError;
use crate::event::{types, Event};
use crate::observability::{events, fields};
use crate::store::{rule_name_of, Cell, EntityStore, FIELD_BOX_NAME, FIELD_NAME};
use crate::uri;
use entity_key::EntityKey;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

const COMPONENT: &str = "subscriber";

/// Single-threaded consumer of the control topic.
///
/// Each lifecycle event is applied as an unregister/register pair. The
/// pair is not atomic as a unit; the brief window where the old rule is
/// absent is bounded by subscriber latency and accepted in exchange for
/// never holding the rules lock across a store read.
pub(crate) struct ControlPlaneSubscriber {
    table: Arc<RuleTable>,
    registrar: Arc<RuleRegistrar>,
    store: Arc<dyn EntityStore>,
    cell_locks: Arc<dyn CellLockManager>,
}

impl ControlPlaneSubscriber {
    pub(crate) fn new(
        table: Arc<RuleTable>,
        registrar: Arc<RuleRegistrar>,
        store: Arc<dyn EntityStore>,
        cell_locks: Arc<dyn CellLockManager>,
    ) -> Self {
        Self {
            table,
            registrar,
            store,
            cell_locks,
        }
    }

    /// Consumes control events until shutdown is signalled or the stream
    /// ends. Failures of individual events never end the loop.
    pub(crate) async fn run(
        self: Arc<Self>,
        subscription: Arc<dyn EventSubscriber>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            event = events::SUBSCRIBER_START,
            component = COMPONENT,
            worker_thread = fields::current_thread_name_or_default().as_str(),
            "control-plane subscriber running"
        );
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                received = subscription.recv() => match received {
                    Some(control_event) => {
                        let applied = self.handle_control_event(&control_event).await;
                        debug!(
                            event = events::CONTROL_EVENT_APPLIED,
                            component = COMPONENT,
                            event_type = control_event.event_type.as_deref().unwrap_or("none"),
                            applied,
                            "control event processed"
                        );
                    }
                    None => {
                        info!(
                            event = events::SUBSCRIBER_RECV_CLOSED,
                            component = COMPONENT,
                            "control stream ended"
                        );
                        break;
                    }
                }
            }
        }
        info!(
            event = events::SUBSCRIBER_STOP,
            component = COMPONENT,
            "control-plane subscriber stopped"
        );
    }

    /// Applies one control event; the returned flag reports success and is
    /// informational only (no retry).
    pub(crate) async fn handle_control_event(&self, event: &Event) -> bool {
        let cell = match &event.cell_id {
            Some(cell_id) => self.store.get_cell(cell_id).await,
            None => None,
        };
        let Some(cell) = cell else {
            // The cell is gone; whatever we still index for it is stale.
            if let Some(cell_id) = &event.cell_id {
                self.registrar.purge_cell(cell_id);
            }
            return false;
        };

        if self.cell_locks.status(&cell.id).await == CellStatus::BulkDeletion {
            return false;
        }

        self.cell_locks.inc_ref(&cell.id).await;
        let outcome = self.apply(&cell, event).await;
        self.cell_locks.dec_ref(&cell.id).await;

        match outcome {
            Ok(applied) => applied,
            Err(err) => {
                error!(
                    event = events::CONTROL_EVENT_FAILED,
                    component = COMPONENT,
                    cell_id = cell.id.as_str(),
                    event_type = event.event_type.as_deref().unwrap_or("none"),
                    err = %err,
                    "control event not applied"
                );
                false
            }
        }
    }

    async fn apply(&self, cell: &Cell, event: &Event) -> Result<bool, EngineError> {
        let Some(event_type) = event.event_type.as_deref() else {
            return Ok(false);
        };
        match event_type {
            types::RULE_CREATE => {
                let key = first_key(event.object.as_deref(), "object")?;
                self.registrar.register_by_key(cell, &key).await?;
                Ok(true)
            }
            types::RULE_UPDATE | types::RULE_MERGE => {
                let old_key = first_key(event.object.as_deref(), "object")?;
                // Register even when the old key was never indexed, so an
                // update observed before its create still lands.
                self.registrar.unregister_by_key(cell, &old_key).await;
                let new_key = first_key(event.info.as_deref(), "info")?;
                self.registrar.register_by_key(cell, &new_key).await?;
                Ok(true)
            }
            types::RULE_DELETE => {
                let key = first_key(event.object.as_deref(), "object")?;
                Ok(self.registrar.unregister_by_key(cell, &key).await)
            }
            types::RULE_LINK_BOX_CREATE | types::RULE_NAVPROP_BOX_CREATE => {
                let rule_key = first_key(event.object.as_deref(), "object")?;
                let box_key = second_key(event.object.as_deref(), "object")?;
                self.registrar.unregister_by_key(cell, &rule_key).await;
                let linked = linked_key(&box_key, &rule_key);
                self.registrar.register_by_key(cell, &linked).await?;
                Ok(true)
            }
            types::RULE_LINK_BOX_DELETE => {
                let rule_key = first_key(event.object.as_deref(), "object")?;
                self.registrar.unregister_by_key(cell, &rule_key).await;
                let unlinked = unlinked_key(&rule_key);
                self.registrar.register_by_key(cell, &unlinked).await?;
                Ok(true)
            }
            types::BOX_LINK_RULE_CREATE => {
                let box_key = first_key(event.object.as_deref(), "object")?;
                let rule_key = second_key(event.object.as_deref(), "object")?;
                self.registrar.unregister_by_key(cell, &rule_key).await;
                let linked = linked_key(&box_key, &rule_key);
                self.registrar.register_by_key(cell, &linked).await?;
                Ok(true)
            }
            types::BOX_LINK_RULE_DELETE => {
                let rule_key = second_key(event.object.as_deref(), "object")?;
                self.registrar.unregister_by_key(cell, &rule_key).await;
                let unlinked = unlinked_key(&rule_key);
                self.registrar.register_by_key(cell, &unlinked).await?;
                Ok(true)
            }
            types::BOX_NAVPROP_RULE_CREATE => {
                let box_key = first_key(event.object.as_deref(), "object")?;
                let rule_key = second_key(event.object.as_deref(), "object")?;
                let linked = linked_key(&box_key, &rule_key);
                self.registrar.register_by_key(cell, &linked).await?;
                Ok(true)
            }
            types::BOX_UPDATE | types::BOX_MERGE => {
                let box_key = first_key(event.info.as_deref(), "info")?;
                if let Some(box_name) = rule_name_of(&box_key) {
                    if let Some(bx) = self.store.find_box_by_name(cell, box_name).await? {
                        let schema = bx
                            .schema
                            .map(|s| uri::local_unit_to_http(&cell.unit_url, &s));
                        let found = self.table.update_box(&cell.id, &bx.id, bx.name, schema);
                        let event_name = if found {
                            events::BOX_UPDATE_APPLIED
                        } else {
                            events::BOX_UPDATE_MISS
                        };
                        debug!(
                            event = event_name,
                            component = COMPONENT,
                            cell_id = cell.id.as_str(),
                            box_id = bx.id.as_str(),
                            "box update"
                        );
                    }
                }
                Ok(true)
            }
            types::CELL_IMPORT => {
                self.registrar.purge_cell(&cell.id);
                self.registrar.load_cell(cell).await?;
                Ok(true)
            }
            _ => {
                debug!(
                    event = events::CONTROL_EVENT_IGNORED,
                    component = COMPONENT,
                    event_type,
                    "not a rule lifecycle event"
                );
                Ok(false)
            }
        }
    }
}

fn first_key(fragment: Option<&str>, field: &'static str) -> Result<EntityKey, EngineError> {
    let fragment = fragment.ok_or(EngineError::MissingFragment(field))?;
    Ok(EntityKey::first_from_fragment(fragment)?)
}

fn second_key(fragment: Option<&str>, field: &'static str) -> Result<EntityKey, EngineError> {
    let fragment = fragment.ok_or(EngineError::MissingFragment(field))?;
    Ok(EntityKey::second_from_fragment(fragment)?)
}

// Compound key of a rule linked to a box.
fn linked_key(box_key: &EntityKey, rule_key: &EntityKey) -> EntityKey {
    EntityKey::complex([
        (FIELD_BOX_NAME, rule_name_of(box_key).map(str::to_string)),
        (FIELD_NAME, rule_name_of(rule_key).map(str::to_string)),
    ])
}

// Compound key of a rule after its box link is removed.
fn unlinked_key(rule_key: &EntityKey) -> EntityKey {
    EntityKey::complex([
        (FIELD_BOX_NAME, None),
        (FIELD_NAME, rule_name_of(rule_key).map(str::to_string)),
    ])
}
