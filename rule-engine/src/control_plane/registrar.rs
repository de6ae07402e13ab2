//! Registration orchestration across the rule index, the box index, the
//! store, and the timer sink.

use crate::control_plane::rule_table::{RuleInfo, RuleTable};
use crate::error::EngineError;
use crate::observability::{events, fields};
use crate::store::{Cell, EntityStore, RuleEntity};
use crate::timer::{TimerEventSink, TimerRuleSpec};
use crate::uri;
use entity_key::EntityKey;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::store::{box_name_of, rule_name_of};

const COMPONENT: &str = "registrar";

/// Applies rule lifecycle transitions to the indexes.
pub(crate) struct RuleRegistrar {
    table: Arc<RuleTable>,
    store: Arc<dyn EntityStore>,
    timer: Option<Arc<dyn TimerEventSink>>,
}

impl RuleRegistrar {
    pub(crate) fn new(
        table: Arc<RuleTable>,
        store: Arc<dyn EntityStore>,
        timer: Option<Arc<dyn TimerEventSink>>,
    ) -> Self {
        Self {
            table,
            store,
            timer,
        }
    }

    /// Registers one store entity: normalizes unit-relative URLs, resolves
    /// the declared box, and inserts under the compound key. Fails without
    /// touching the index when the entity has no action or its box cannot
    /// be resolved.
    pub(crate) async fn register_entity(
        &self,
        cell: &Cell,
        entity: RuleEntity,
    ) -> Result<(), EngineError> {
        let Some(action) = entity.action else {
            return Err(EngineError::MissingAction(entity.name));
        };

        let subject = entity
            .subject
            .map(|s| uri::local_unit_to_http(&cell.unit_url, &s));
        let service = entity
            .service
            .map(|s| uri::local_unit_to_http(&cell.unit_url, &s));

        let mut box_id = None;
        if let Some(box_name) = &entity.box_name {
            let Some(bx) = self.store.find_box_by_name(cell, box_name).await? else {
                return Err(EngineError::UnresolvedBox {
                    rule: entity.name,
                    box_name: box_name.clone(),
                });
            };
            let schema = bx
                .schema
                .map(|s| uri::local_unit_to_http(&cell.unit_url, &s));
            box_id = Some(self.table.attach_box(&cell.id, bx.id, bx.name, schema));
        }

        let key = RuleTable::rule_key(&entity.name, box_id.as_deref());
        let rule = RuleInfo {
            name: entity.name,
            external: entity.external,
            subject,
            event_type: entity.event_type,
            object: entity.object,
            info: entity.info,
            action,
            service,
            box_id: box_id.clone(),
        };
        let timer_spec = self.timer.as_ref().map(|_| TimerRuleSpec {
            name: rule.name.clone(),
            subject: rule.subject.clone(),
            event_type: rule.event_type.clone(),
            object: rule.object.clone(),
            info: rule.info.clone(),
            cell_id: cell.id.clone(),
            box_id: box_id.clone(),
        });

        let rule_name = rule.name.clone();
        self.table.insert_rule(&cell.id, key, rule);
        debug!(
            event = events::RULE_REGISTER_OK,
            component = COMPONENT,
            cell_id = cell.id.as_str(),
            rule = rule_name.as_str(),
            box_id = fields::format_opt(box_id.as_deref()),
            "registered rule"
        );
        if let (Some(timer), Some(spec)) = (&self.timer, timer_spec) {
            timer.register(spec);
        }
        Ok(())
    }

    /// Reads a rule from the store by key and registers it.
    pub(crate) async fn register_by_key(
        &self,
        cell: &Cell,
        key: &EntityKey,
    ) -> Result<(), EngineError> {
        let entity = self.store.read_rule(cell, key).await?;
        self.register_entity(cell, entity).await
    }

    /// Unregisters a rule by its name and (optionally) linked box name.
    /// Returns whether a rule was actually removed.
    pub(crate) async fn unregister(
        &self,
        cell: &Cell,
        rule_name: &str,
        box_name: Option<&str>,
    ) -> bool {
        let box_id = match box_name {
            Some(name) => self
                .store
                .find_box_by_name(cell, name)
                .await
                .ok()
                .flatten()
                .map(|bx| bx.id),
            None => None,
        };

        let key = RuleTable::rule_key(rule_name, box_id.as_deref());
        let Some(removed) = self.table.remove_rule(&cell.id, &key) else {
            debug!(
                event = events::RULE_UNREGISTER_MISS,
                component = COMPONENT,
                cell_id = cell.id.as_str(),
                rule = rule_name,
                "no rule under key"
            );
            return false;
        };

        debug!(
            event = events::RULE_UNREGISTER_OK,
            component = COMPONENT,
            cell_id = cell.id.as_str(),
            rule = removed.name.as_str(),
            "unregistered rule"
        );
        if let Some(timer) = &self.timer {
            timer.unregister(TimerRuleSpec {
                name: removed.name,
                subject: removed.subject,
                event_type: removed.event_type,
                object: removed.object,
                info: removed.info,
                cell_id: cell.id.clone(),
                box_id,
            });
        }
        true
    }

    /// Unregisters the rule a parsed key designates.
    pub(crate) async fn unregister_by_key(&self, cell: &Cell, key: &EntityKey) -> bool {
        let Some(rule_name) = rule_name_of(key) else {
            return false;
        };
        self.unregister(cell, rule_name, box_name_of(key)).await
    }

    /// Drops every index entry of one cell.
    pub(crate) fn purge_cell(&self, cell_id: &str) {
        info!(
            event = events::CELL_PURGE,
            component = COMPONENT,
            cell_id,
            "purging cell from the index"
        );
        self.table.purge_cell(cell_id);
    }

    /// Enumerates and registers every rule of one cell; a single rule's
    /// failure is logged and does not stop the rest.
    pub(crate) async fn load_cell(&self, cell: &Cell) -> Result<(), EngineError> {
        for entity in self.store.list_rules(cell).await? {
            let rule = entity.name.clone();
            if let Err(err) = self.register_entity(cell, entity).await {
                warn!(
                    event = events::RULE_REGISTER_FAILED,
                    component = COMPONENT,
                    cell_id = cell.id.as_str(),
                    rule = rule.as_str(),
                    err = %err,
                    "skipping rule"
                );
            }
        }
        Ok(())
    }
}
