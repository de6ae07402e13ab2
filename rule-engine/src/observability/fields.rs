//! Canonical structured field keys and value-format helpers.

pub const NONE: &str = "none";
pub const DEFAULT_WORKER_THREAD: &str = "unknown-thread";

/// Renders an optional string field without allocating a placeholder enum.
pub fn format_opt(value: Option<&str>) -> &str {
    value.unwrap_or(NONE)
}

pub fn thread_name_or_default(thread_name: Option<&str>) -> String {
    thread_name.unwrap_or(DEFAULT_WORKER_THREAD).to_string()
}

pub fn current_thread_name_or_default() -> String {
    thread_name_or_default(std::thread::current().name())
}

#[cfg(test)]
mod tests {
    use super::{format_opt, thread_name_or_default, DEFAULT_WORKER_THREAD, NONE};

    #[test]
    fn format_opt_falls_back_to_none() {
        assert_eq!(format_opt(None), NONE);
        assert_eq!(format_opt(Some("cell-1")), "cell-1");
    }

    #[test]
    fn thread_name_or_default_falls_back_when_absent() {
        assert_eq!(thread_name_or_default(None), DEFAULT_WORKER_THREAD);
        assert_eq!(thread_name_or_default(Some("named-thread")), "named-thread");
    }
}
