//! Cooperative scheduling helpers.
//!
//! Operations in this crate run to completion on one thread; long-running
//! work is expected to check a deadline between operations and yield
//! control when it expires, rather than being preempted.

use std::time::{Duration, Instant};

/// A point in time after which a cooperative task should yield.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Creates a deadline `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    /// Returns true once the deadline has passed.
    #[must_use]
    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Returns the time left, zero once expired.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}
