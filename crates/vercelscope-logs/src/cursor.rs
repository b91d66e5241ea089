use vercelscope_types::LogEvent;

/// Compute the timestamp to resume a live tail from
///
/// Returns the maximum resolved timestamp in the batch (top-level `created`
/// first, then `payload.created`); events without a timestamp do not
/// participate. `None` means there is no cursor and the live-tail request
/// must omit its lower bound.
pub fn resume_cursor(events: &[LogEvent]) -> Option<i64> {
    events.iter().filter_map(LogEvent::timestamp).max()
}
