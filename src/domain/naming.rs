//! Ownership-scoped name prefixing
//!
//! A child entity's storage name is `"<parentId>:<name>"` so the same
//! display name can be reused under different parents while the repository
//! enforces a single uniqueness constraint on the stored name. The public
//! `name` shown back to callers is always the un-prefixed value.

/// Separator between scope id and display name
const SCOPE_SEPARATOR: char = ':';

/// Separator before the metric-history timestamp suffix
const HISTORY_SEPARATOR: &str = "__";

/// Prefix `name` with the owning scope when one is present.
pub fn prefix_when_owned(parent_id: Option<&str>, name: &str) -> String {
    match parent_id {
        Some(parent) => format!("{}{}{}", parent, SCOPE_SEPARATOR, name),
        None => name.to_string(),
    }
}

/// Strip the scope prefix from a stored name for display.
pub fn strip_scope_prefix(stored: &str) -> &str {
    match stored.split_once(SCOPE_SEPARATOR) {
        Some((_, name)) => name,
        None => stored,
    }
}

/// Build the storage name of a metric-history record:
/// `"<runId>:<metricName>__<timestamp>"`. The timestamp keeps repeated
/// writes of the same logical metric from colliding.
pub fn metric_history_name(run_id: &str, metric_name: &str, timestamp: &str) -> String {
    format!(
        "{}{}{}{}{}",
        run_id, SCOPE_SEPARATOR, metric_name, HISTORY_SEPARATOR, timestamp
    )
}

/// Strip the `__<timestamp>` suffix off a stored metric-history name.
pub fn strip_history_suffix(name: &str) -> &str {
    match name.rfind(HISTORY_SEPARATOR) {
        Some(idx) => &name[..idx],
        None => name,
    }
}
