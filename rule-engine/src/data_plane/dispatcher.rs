//! Inbound event dispatch.

use crate::broker::EventPublisher;
use crate::cell_lock::{CellLockManager, CellStatus};
use crate::control_plane::rule_table::RuleTable;
use crate::data_plane::action::{ActionInfo, ActionSink, ActionTask};
use crate::event::{types, Event};
use crate::matching::{matcher, service_resolution};
use crate::observability::events;
use crate::store::{Cell, EntityStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "dispatcher";

/// Matches one inbound event against its cell's rules and schedules the
/// resulting actions.
pub(crate) struct Dispatcher {
    table: Arc<RuleTable>,
    store: Arc<dyn EntityStore>,
    cell_locks: Arc<dyn CellLockManager>,
    actions: Arc<dyn ActionSink>,
    publisher: Arc<dyn EventPublisher>,
    max_event_hop: u32,
}

impl Dispatcher {
    pub(crate) fn new(
        table: Arc<RuleTable>,
        store: Arc<dyn EntityStore>,
        cell_locks: Arc<dyn CellLockManager>,
        actions: Arc<dyn ActionSink>,
        publisher: Arc<dyn EventPublisher>,
        max_event_hop: u32,
    ) -> Self {
        Self {
            table,
            store,
            cell_locks,
            actions,
            publisher,
            max_event_hop,
        }
    }

    /// Returns after all matched actions are queued, not after they ran.
    /// Invalid inputs (no cell id, unknown cell) are silent no-ops.
    pub(crate) async fn judge(&self, mut event: Event) {
        let Some(cell_id) = event.cell_id.clone() else {
            return;
        };
        let Some(cell) = self.store.get_cell(&cell_id).await else {
            return;
        };

        if self.cell_locks.status(&cell.id).await == CellStatus::BulkDeletion {
            debug!(
                event = events::JUDGE_SKIP_BULK_DELETION,
                component = COMPONENT,
                cell_id = cell.id.as_str(),
                "cell is under bulk deletion; declining"
            );
            return;
        }

        // Paired with dec_ref below; judge_guarded has no early return.
        self.cell_locks.inc_ref(&cell.id).await;
        self.judge_guarded(&cell, &mut event).await;
        self.cell_locks.dec_ref(&cell.id).await;
    }

    async fn judge_guarded(&self, cell: &Cell, event: &mut Event) {
        let event_id = event.ensure_event_id();
        let rule_chain = self.advance_rule_chain(event.rule_chain.as_deref());

        let mut action_list = Vec::new();
        if let Some(rule_chain) = &rule_chain {
            self.table.for_each_rule(&cell.id, |rule, linked_box| {
                if !matcher::matches(rule, linked_box, event) {
                    return;
                }
                match service_resolution::resolve_service(rule, linked_box, &cell.url) {
                    Ok(service) => action_list.push(ActionInfo {
                        action: rule.action.clone(),
                        service,
                        event_id: event_id.clone(),
                        rule_chain: rule_chain.clone(),
                    }),
                    Err(err) => warn!(
                        event = events::ACTION_SKIP_UNRESOLVED_BOX,
                        component = COMPONENT,
                        cell_id = cell.id.as_str(),
                        rule = rule.name.as_str(),
                        err = %err,
                        "ignoring matched rule"
                    ),
                }
            });
        }

        event.convert_object(&cell.url);

        // Timer events may only speak for subjects inside their own cell.
        if matches!(
            event.event_type.as_deref(),
            Some(types::TIMER_PERIODIC) | Some(types::TIMER_ONESHOT)
        ) {
            if let Some(subject) = &event.subject {
                if !subject.starts_with(&cell.url) {
                    event.reset_subject();
                }
            }
        }

        for action in action_list {
            debug!(
                event = events::ACTION_SUBMIT,
                component = COMPONENT,
                cell_id = cell.id.as_str(),
                action = action.action.as_str(),
                service = action.service.as_deref().unwrap_or("none"),
                event_id = action.event_id.as_str(),
                rule_chain = action.rule_chain.as_str(),
                "submitting action"
            );
            self.actions.submit(ActionTask {
                cell: cell.clone(),
                action,
                event: event.clone(),
            });
        }

        if should_republish(event) {
            match self.publisher.send(event).await {
                Ok(()) => debug!(
                    event = events::EVENT_REPUBLISH,
                    component = COMPONENT,
                    cell_id = cell.id.as_str(),
                    event_type = event.event_type.as_deref().unwrap_or("none"),
                    "republished control event"
                ),
                Err(err) => warn!(
                    event = events::EVENT_REPUBLISH_FAILED,
                    component = COMPONENT,
                    cell_id = cell.id.as_str(),
                    err = %err,
                    "republish failed"
                ),
            }
        }
    }

    // Advances the hop counter; `None` means matching is skipped while the
    // rest of the dispatch path still runs.
    fn advance_rule_chain(&self, rule_chain: Option<&str>) -> Option<String> {
        let current = rule_chain.unwrap_or("0");
        match current.parse::<u32>() {
            Ok(hops) if hops + 1 <= self.max_event_hop => Some((hops + 1).to_string()),
            Ok(_) => None,
            Err(_) => {
                info!(
                    event = events::JUDGE_INVALID_RULE_CHAIN,
                    component = COMPONENT,
                    rule_chain = current,
                    "unparseable rule chain; skipping matching"
                );
                None
            }
        }
    }
}

/// Control events of internal origin are republished onto the rule topic;
/// data-plane and external events never are.
fn should_republish(event: &Event) -> bool {
    !event.external
        && event
            .event_type
            .as_deref()
            .is_some_and(types::is_control)
}
