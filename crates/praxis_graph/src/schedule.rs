// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cooperative delay scheduler driven by the host tick.

/// Handle to a pending scheduled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Entry<T> {
    handle: TimerHandle,
    remaining: f32,
    payload: T,
}

/// Cooperative delay scheduler.
///
/// All waiting in the engine is expressed as entries here and resumed
/// from [`Scheduler::tick`]; nothing blocks the host tick, and there
/// are no threads. Cancellation is explicit through the returned
/// [`TimerHandle`].
#[derive(Debug)]
pub struct Scheduler<T> {
    entries: Vec<Entry<T>>,
    next_handle: u64,
}

impl<T> Scheduler<T> {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_handle: 0,
        }
    }

    /// Schedule `payload` to come due after `delay` seconds
    pub fn schedule(&mut self, delay: f32, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(Entry {
            handle,
            remaining: delay.max(0.0),
            payload,
        });
        handle
    }

    /// Cancel a pending entry. Returns `false` when it already fired
    /// or was cancelled before.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    /// Drop every pending entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Advance time by `dt` seconds; returns the payloads now due, in
    /// scheduling order
    pub fn tick(&mut self, dt: f32) -> Vec<T> {
        for entry in &mut self.entries {
            entry.remaining -= dt;
        }
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].remaining <= 0.0 {
                due.push(self.entries.remove(i).payload);
            } else {
                i += 1;
            }
        }
        due
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
