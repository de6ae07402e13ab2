//! Service-URL resolution for matched rules.

use crate::control_plane::rule_table::{BoxInfo, RuleInfo};
use crate::uri;
use thiserror::Error;

/// A `localbox:` service whose rule has no resolvable box.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("rule is not linked to a resolvable box")]
pub(crate) struct UnresolvedBoxError;

/// Resolves a matched rule's service field to absolute form.
///
/// `localcell:` expands against the cell URL and `localbox:` against the
/// cell URL plus the linked box's name; anything else passes through.
pub(crate) fn resolve_service(
    rule: &RuleInfo,
    linked_box: Option<&BoxInfo>,
    cell_url: &str,
) -> Result<Option<String>, UnresolvedBoxError> {
    let Some(service) = &rule.service else {
        return Ok(None);
    };
    if service.starts_with(uri::LOCAL_CELL) {
        return Ok(Some(uri::local_cell_to_http(cell_url, service)));
    }
    if service.starts_with(uri::LOCAL_BOX) {
        let Some(bx) = linked_box else {
            return Err(UnresolvedBoxError);
        };
        return Ok(Some(uri::local_box_to_http(cell_url, &bx.name, service)));
    }
    Ok(Some(service.clone()))
}
