use std::time::{Duration, Instant};

/// A single pending deferred action with cancel-and-restart semantics.
///
/// Every [`schedule`](Debouncer::schedule) replaces the pending value and
/// pushes the deadline out again. A timer that wakes before the latest
/// deadline finds nothing ready; the timer started by the latest schedule
/// commits.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    deadline: Instant,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Replaces whatever is pending and restarts the quiet window at `now`.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.window,
        });
    }

    /// The pending value once the window has fully elapsed since the latest
    /// schedule.
    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(pending) if now >= pending.deadline => {
                self.pending.take().map(|pending| pending.value)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
