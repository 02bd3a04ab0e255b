//! Change batching.
//!
//! The observer is a thin coalescing layer over the store's explicit
//! mutation API: mutators report the paths they touched, and all paths
//! recorded between the outermost `begin`/`end` pair form one
//! [`ChangeEvent`]. Downstream renderers therefore do one synchronized pass
//! per logical mutation turn instead of one pass per primitive write.

/// The ordered list of paths structurally altered in one mutation turn.
/// Deduplication is not required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub paths: Vec<String>,
}

/// Collects touched paths for the current mutation turn.
#[derive(Debug, Default)]
pub struct ChangeObserver {
    pending: Vec<String>,
    depth: u32,
}

impl ChangeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a mutation turn. Turns nest; only the outermost `end` emits.
    pub fn begin(&mut self) {
        self.depth += 1;
    }

    /// Record one touched path. Mutators report only semantic paths, so
    /// every recorded path is kept; `length` is an ordinary key like any
    /// other.
    pub fn record(&mut self, path: impl Into<String>) {
        self.pending.push(path.into());
    }

    pub fn record_all<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = String>,
    {
        for path in paths {
            self.record(path);
        }
    }

    /// Close the current turn. The outermost close drains the pending paths
    /// into a single event; empty turns emit nothing.
    pub fn end(&mut self) -> Option<ChangeEvent> {
        self.depth = self.depth.saturating_sub(1);
        if self.depth > 0 || self.pending.is_empty() {
            return None;
        }
        Some(ChangeEvent {
            paths: std::mem::take(&mut self.pending),
        })
    }
}
