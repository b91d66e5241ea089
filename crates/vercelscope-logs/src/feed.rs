use vercelscope_types::LogEvent;

/// Per-deployment-view log state exposed to the rendering layer
///
/// Append-only: once seeded with the historical batch, the only mutation is
/// appending live-tail events in arrival order. The feed is owned by the
/// [`LogStreamController`](crate::LogStreamController) bound to the viewed
/// deployment and is reset wholesale when that binding changes.
#[derive(Debug)]
pub struct LogFeed {
    events: Vec<LogEvent>,
    is_loading: bool,
}

impl LogFeed {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            is_loading: true,
        }
    }

    /// Events in arrival order
    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    /// Whether the historical fetch is still in flight
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Seed with the historical batch and clear the loading flag
    pub(crate) fn seed(&mut self, events: Vec<LogEvent>) {
        self.events = events;
        self.is_loading = false;
    }

    /// Clear the loading flag without seeding (failed historical fetch)
    pub(crate) fn finish_loading(&mut self) {
        self.is_loading = false;
    }

    /// Append live-tail events in arrival order
    pub(crate) fn append(&mut self, events: Vec<LogEvent>) {
        self.events.extend(events);
    }

    /// Full reset back to the empty, loading state
    pub(crate) fn reset(&mut self) {
        self.events.clear();
        self.is_loading = true;
    }
}

impl Default for LogFeed {
    fn default() -> Self {
        Self::new()
    }
}
