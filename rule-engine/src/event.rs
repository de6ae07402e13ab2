//! Event model shared by the data plane and the control plane.

use crate::uri;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event-type vocabulary the engine consumes and republishes.
pub mod types {
    pub const RULE_CREATE: &str = "cellctl.Rule.create";
    pub const RULE_UPDATE: &str = "cellctl.Rule.update";
    pub const RULE_MERGE: &str = "cellctl.Rule.merge";
    pub const RULE_DELETE: &str = "cellctl.Rule.delete";
    pub const RULE_LINK_BOX_CREATE: &str = "cellctl.Rule.links.Box.create";
    pub const RULE_LINK_BOX_DELETE: &str = "cellctl.Rule.links.Box.delete";
    pub const BOX_LINK_RULE_CREATE: &str = "cellctl.Box.links.Rule.create";
    pub const BOX_LINK_RULE_DELETE: &str = "cellctl.Box.links.Rule.delete";
    pub const RULE_NAVPROP_BOX_CREATE: &str = "cellctl.Rule.navprop.Box.create";
    pub const BOX_NAVPROP_RULE_CREATE: &str = "cellctl.Box.navprop.Rule.create";
    pub const BOX_UPDATE: &str = "cellctl.Box.update";
    pub const BOX_MERGE: &str = "cellctl.Box.merge";
    pub const CELL_IMPORT: &str = "cell.import";

    pub const TIMER_PERIODIC: &str = "timer.periodic";
    pub const TIMER_ONESHOT: &str = "timer.oneshot";

    /// Whether an event type belongs to the cell-control topic the engine
    /// applies to its index and republishes.
    pub fn is_control(event_type: &str) -> bool {
        matches!(
            event_type,
            RULE_CREATE
                | RULE_UPDATE
                | RULE_MERGE
                | RULE_DELETE
                | RULE_LINK_BOX_CREATE
                | RULE_LINK_BOX_DELETE
                | BOX_LINK_RULE_CREATE
                | BOX_LINK_RULE_DELETE
                | RULE_NAVPROP_BOX_CREATE
                | BOX_NAVPROP_RULE_CREATE
                | BOX_UPDATE
                | BOX_MERGE
                | CELL_IMPORT
        )
    }
}

/// One platform event, data-plane or control-plane.
///
/// `external` marks events originating outside the platform; `rule_chain`
/// is the string-encoded hop counter bounding action cascades.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Event {
    pub cell_id: Option<String>,
    pub external: bool,
    pub event_type: Option<String>,
    pub schema: Option<String>,
    pub subject: Option<String>,
    pub object: Option<String>,
    pub info: Option<String>,
    pub event_id: Option<String>,
    pub rule_chain: Option<String>,
}

impl Event {
    /// Returns the event id, generating and attaching a fresh one when
    /// absent.
    pub(crate) fn ensure_event_id(&mut self) -> String {
        match &self.event_id {
            Some(id) => id.clone(),
            None => {
                let id = Uuid::new_v4().to_string();
                self.event_id = Some(id.clone());
                id
            }
        }
    }

    /// Rewrites a cell-relative `object` to absolute form.
    pub(crate) fn convert_object(&mut self, cell_url: &str) {
        if let Some(object) = &self.object {
            self.object = Some(uri::local_cell_to_http(cell_url, object));
        }
    }

    pub(crate) fn reset_subject(&mut self) {
        self.subject = None;
    }
}
