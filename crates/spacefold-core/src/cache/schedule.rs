use std::time::{Duration, Instant};

/// Trailing debounce for write-behind flushes.
///
/// Every write re-arms the deadline, so a burst of writes produces one flush
/// `interval` after the last of them. Nothing runs on its own: the owner polls
/// [`FlushSchedule::due`] from its event loop.
#[derive(Debug, Clone)]
pub struct FlushSchedule {
    interval: Duration,
    deadline: Option<Instant>,
}

impl FlushSchedule {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub fn due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }
}
