//! Rule-index and box-index storage owner.
//!
//! Two per-cell maps guarded by two distinct locks: `rules` (the primary
//! index, `rule key -> RuleInfo`) and `boxes` (`box id -> BoxInfo`,
//! refcounted by the rules that link it). When both locks are needed the
//! rules lock is acquired first, then the boxes lock, never the reverse.
//! Neither lock is ever held across `.await` or a collaborator call; every
//! operation here is synchronous and index-only.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Shared box entry of one cell. Exists iff at least one registered rule
/// references it (`ref_count >= 1`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct BoxInfo {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) schema: Option<String>,
    pub(crate) ref_count: usize,
}

/// In-memory form of one registered rule.
///
/// `box_id` is a borrowed handle into the box index, not ownership; box
/// lifetime is dictated solely by its refcount.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct RuleInfo {
    pub(crate) name: String,
    pub(crate) external: Option<bool>,
    pub(crate) subject: Option<String>,
    pub(crate) event_type: Option<String>,
    pub(crate) object: Option<String>,
    pub(crate) info: Option<String>,
    pub(crate) action: String,
    pub(crate) service: Option<String>,
    pub(crate) box_id: Option<String>,
}

/// Consistent per-cell view of both indexes, taken under the locks.
#[derive(Clone, Debug, Default)]
pub(crate) struct CellSnapshot {
    pub(crate) rules: Vec<(RuleInfo, Option<BoxInfo>)>,
    pub(crate) boxes: Vec<BoxInfo>,
}

type CellMap<T> = HashMap<String, HashMap<String, T>>;

/// Authoritative storage owner for both indexes.
pub(crate) struct RuleTable {
    rules: Mutex<CellMap<RuleInfo>>,
    boxes: Mutex<CellMap<BoxInfo>>,
}

impl RuleTable {
    /// Creates an empty table.
    pub(crate) fn new() -> Self {
        Self {
            rules: Mutex::new(HashMap::new()),
            boxes: Mutex::new(HashMap::new()),
        }
    }

    /// Primary key of a rule within its cell.
    pub(crate) fn rule_key(rule_name: &str, box_id: Option<&str>) -> String {
        format!("{rule_name}.{}", box_id.unwrap_or(""))
    }

    /// Attaches one rule reference to a box, inserting the entry on first
    /// reference. Returns the box id the rule should hold.
    pub(crate) fn attach_box(
        &self,
        cell_id: &str,
        id: String,
        name: String,
        schema: Option<String>,
    ) -> String {
        let mut boxes = self.boxes.lock();
        let cell_boxes = boxes.entry(cell_id.to_string()).or_default();
        let entry = cell_boxes.entry(id.clone()).or_insert_with(|| BoxInfo {
            id: id.clone(),
            name,
            schema,
            ref_count: 0,
        });
        entry.ref_count += 1;
        id
    }

    /// Inserts a rule under its key. A displaced rule with the same key
    /// gives up its box reference so refcounts stay exact.
    pub(crate) fn insert_rule(&self, cell_id: &str, key: String, rule: RuleInfo) {
        let mut rules = self.rules.lock();
        let displaced = rules
            .entry(cell_id.to_string())
            .or_default()
            .insert(key, rule);
        if let Some(displaced) = displaced {
            if let Some(box_id) = &displaced.box_id {
                self.release_box(cell_id, box_id);
            }
        }
    }

    /// Removes a rule by key, releasing its box reference when linked.
    pub(crate) fn remove_rule(&self, cell_id: &str, key: &str) -> Option<RuleInfo> {
        let mut rules = self.rules.lock();
        let removed = rules.get_mut(cell_id)?.remove(key)?;
        if let Some(box_id) = &removed.box_id {
            self.release_box(cell_id, box_id);
        }
        Some(removed)
    }

    // Caller holds the rules lock; nesting the boxes lock here keeps the
    // rules -> boxes acquisition order.
    fn release_box(&self, cell_id: &str, box_id: &str) {
        let mut boxes = self.boxes.lock();
        let Some(cell_boxes) = boxes.get_mut(cell_id) else {
            return;
        };
        let Some(entry) = cell_boxes.get_mut(box_id) else {
            return;
        };
        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            cell_boxes.remove(box_id);
            if cell_boxes.is_empty() {
                boxes.remove(cell_id);
            }
        }
    }

    /// Drops both per-cell maps.
    pub(crate) fn purge_cell(&self, cell_id: &str) {
        let mut rules = self.rules.lock();
        rules.remove(cell_id);
        let mut boxes = self.boxes.lock();
        boxes.remove(cell_id);
    }

    /// Overwrites name and schema of a shared box in place; every rule
    /// linked to it observes the new values. Returns whether it existed.
    pub(crate) fn update_box(
        &self,
        cell_id: &str,
        box_id: &str,
        name: String,
        schema: Option<String>,
    ) -> bool {
        let mut boxes = self.boxes.lock();
        let Some(entry) = boxes.get_mut(cell_id).and_then(|m| m.get_mut(box_id)) else {
            return false;
        };
        entry.name = name;
        entry.schema = schema;
        true
    }

    /// Iterates one cell's rules under the rules lock, resolving each
    /// rule's box under the nested boxes lock for the duration of the call.
    pub(crate) fn for_each_rule<F>(&self, cell_id: &str, mut visit: F)
    where
        F: FnMut(&RuleInfo, Option<&BoxInfo>),
    {
        let rules = self.rules.lock();
        let Some(cell_rules) = rules.get(cell_id) else {
            return;
        };
        for rule in cell_rules.values() {
            match rule.box_id.as_deref() {
                Some(box_id) => {
                    let boxes = self.boxes.lock();
                    let linked = boxes.get(cell_id).and_then(|m| m.get(box_id));
                    visit(rule, linked);
                }
                None => visit(rule, None),
            }
        }
    }

    /// Takes a consistent snapshot of one cell's rules and boxes.
    pub(crate) fn snapshot_cell(&self, cell_id: &str) -> CellSnapshot {
        let rules = self.rules.lock();
        let boxes = self.boxes.lock();
        let cell_boxes = boxes.get(cell_id);
        let snapshot_rules = rules
            .get(cell_id)
            .map(|cell_rules| {
                cell_rules
                    .values()
                    .map(|rule| {
                        let linked = rule
                            .box_id
                            .as_deref()
                            .and_then(|box_id| cell_boxes.and_then(|m| m.get(box_id)))
                            .cloned();
                        (rule.clone(), linked)
                    })
                    .collect()
            })
            .unwrap_or_default();
        let snapshot_boxes = cell_boxes
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        CellSnapshot {
            rules: snapshot_rules,
            boxes: snapshot_boxes,
        }
    }

    #[cfg(test)]
    pub(crate) fn box_ref_count(&self, cell_id: &str, box_id: &str) -> Option<usize> {
        let boxes = self.boxes.lock();
        boxes
            .get(cell_id)
            .and_then(|m| m.get(box_id))
            .map(|entry| entry.ref_count)
    }

    #[cfg(test)]
    pub(crate) fn rule_count(&self, cell_id: &str) -> usize {
        let rules = self.rules.lock();
        rules.get(cell_id).map_or(0, HashMap::len)
    }
}
