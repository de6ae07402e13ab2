//! Rewriting between the local URL schemes and absolute `http(s)` form.
//!
//! Three deployment-relative schemes participate: `localunit:` (relative to
//! the unit), `localcell:` (relative to a cell), and `localbox:` (relative
//! to a box within a cell). Rules and events may carry any of them; the
//! engine resolves to absolute form at registration and dispatch time.
//! All rewriters are pure and pass unrecognized values through unchanged.

/// Scheme prefix of unit-relative URLs.
pub const LOCAL_UNIT: &str = "localunit:";
/// Scheme prefix of cell-relative URLs.
pub const LOCAL_CELL: &str = "localcell:";
/// Scheme prefix of box-relative URLs.
pub const LOCAL_BOX: &str = "localbox:";

/// Replaces a leading `localunit:` with the unit URL.
pub fn local_unit_to_http(unit_url: &str, value: &str) -> String {
    match value.strip_prefix(LOCAL_UNIT) {
        Some(rest) => join(unit_url, rest),
        None => value.to_string(),
    }
}

/// Replaces a leading `localcell:` with the cell URL.
pub fn local_cell_to_http(cell_url: &str, value: &str) -> String {
    match value.strip_prefix(LOCAL_CELL) {
        Some(rest) => join(cell_url, rest),
        None => value.to_string(),
    }
}

/// Replaces a leading `localbox:` with the box's cell-relative form,
/// `localcell:/<box_name>/…`.
pub fn local_box_to_local_cell(value: &str, box_name: &str) -> String {
    match value.strip_prefix(LOCAL_BOX) {
        Some(rest) => format!(
            "{LOCAL_CELL}/{box_name}/{}",
            rest.trim_start_matches('/')
        ),
        None => value.to_string(),
    }
}

/// Expands a leading `localbox:` directly to absolute form,
/// `<cell_url><box_name>/…`.
pub fn local_box_to_http(cell_url: &str, box_name: &str, value: &str) -> String {
    match value.strip_prefix(LOCAL_BOX) {
        Some(rest) => join(&join(cell_url, box_name), rest),
        None => value.to_string(),
    }
}

fn join(base: &str, rest: &str) -> String {
    let rest = rest.trim_start_matches('/');
    if rest.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), rest)
}

#[cfg(test)]
mod tests {
    use super::{local_box_to_http, local_box_to_local_cell, local_cell_to_http, local_unit_to_http};

    #[test]
    fn local_unit_expands_against_the_unit_url() {
        assert_eq!(
            local_unit_to_http("http://unit.example/", "localunit:/cell1/box1"),
            "http://unit.example/cell1/box1"
        );
    }

    #[test]
    fn local_cell_expands_against_the_cell_url() {
        assert_eq!(
            local_cell_to_http("http://unit.example/cell1/", "localcell:/box1/col"),
            "http://unit.example/cell1/box1/col"
        );
    }

    #[test]
    fn local_box_rewrites_to_cell_relative_form() {
        assert_eq!(
            local_box_to_local_cell("localbox:/col/entity", "box1"),
            "localcell:/box1/col/entity"
        );
    }

    #[test]
    fn local_box_expands_to_absolute_form() {
        assert_eq!(
            local_box_to_http("http://unit.example/cell1/", "box1", "localbox:/svc"),
            "http://unit.example/cell1/box1/svc"
        );
    }

    #[test]
    fn absolute_urls_pass_through() {
        assert_eq!(
            local_cell_to_http("http://unit.example/cell1/", "http://other.example/x"),
            "http://other.example/x"
        );
        assert_eq!(
            local_box_to_local_cell("http://other.example/x", "box1"),
            "http://other.example/x"
        );
    }
}
