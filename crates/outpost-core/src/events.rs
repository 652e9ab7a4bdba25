//! Process timer queue.
//!
//! The queue owns all timer bookkeeping for staged processes: a process
//! asks for a callback at a timestamp and is told the outcome; it never
//! re-registers itself reentrantly. At most one entry is outstanding per
//! process — scheduling again replaces the old entry, and cancellation
//! reports whether anything was actually removed.

use std::collections::HashMap;

use crate::process::ProcessId;

#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: HashMap<ProcessId, u64>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or move) the callback for `id` to fire at `at`.
    pub fn schedule(&mut self, id: ProcessId, at: u64) {
        self.entries.insert(id, at);
    }

    /// Remove any outstanding callback for `id`. Returns whether one
    /// existed — a second cancel is a no-op, not an error.
    pub fn cancel(&mut self, id: ProcessId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// The outstanding fire time for `id`, if any.
    pub fn next_for(&self, id: ProcessId) -> Option<u64> {
        self.entries.get(&id).copied()
    }

    /// Remove and return every entry due at or before `now`, in process-id
    /// order so firing is deterministic within a pulse.
    pub fn drain_due(&mut self, now: u64) -> Vec<(ProcessId, u64)> {
        let mut due: Vec<(ProcessId, u64)> = self
            .entries
            .iter()
            .filter(|(_, &at)| at <= now)
            .map(|(&id, &at)| (id, at))
            .collect();
        due.sort_by_key(|&(id, _)| id);
        for &(id, _) in &due {
            self.entries.remove(&id);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
