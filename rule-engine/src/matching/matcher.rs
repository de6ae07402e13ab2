//! Rule/event match policy.

use crate::control_plane::rule_table::{BoxInfo, RuleInfo};
use crate::event::Event;
use crate::uri;

/// Whether `event` triggers `rule`. All comparisons are case-sensitive.
///
/// A rule without `external` never matches; that is the documented way to
/// disable a rule without deleting it.
pub(crate) fn matches(rule: &RuleInfo, linked_box: Option<&BoxInfo>, event: &Event) -> bool {
    match rule.external {
        Some(external) if external == event.external => {}
        _ => return false,
    }

    if let Some(rule_type) = &rule.event_type {
        match &event.event_type {
            Some(event_type) if event_type.starts_with(rule_type) => {}
            _ => return false,
        }
    }

    if let Some(schema) = linked_box.and_then(|bx| bx.schema.as_deref()) {
        if event.schema.as_deref() != Some(schema) {
            return false;
        }
    }

    if let Some(subject) = &rule.subject {
        if event.subject.as_ref() != Some(subject) {
            return false;
        }
    }

    if let Some(object) = &rule.object {
        let object = match linked_box {
            Some(bx) => uri::local_box_to_local_cell(object, &bx.name),
            None => object.clone(),
        };
        match &event.object {
            Some(event_object) if event_object.starts_with(&object) => {}
            _ => return false,
        }
    }

    if let Some(info) = &rule.info {
        match &event.info {
            Some(event_info) if event_info.starts_with(info) => {}
            _ => return false,
        }
    }

    true
}
