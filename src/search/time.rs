//! Clock management for timed searches.

use std::time::{Duration, Instant};

/// Soft and hard budgets for one move. The soft limit gates starting a new
/// iteration; the hard limit aborts mid-iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBudget {
    pub soft: Duration,
    pub hard: Duration,
}

impl TimeBudget {
    pub fn fixed(d: Duration) -> TimeBudget {
        TimeBudget { soft: d, hard: d }
    }

    /// Deadline pair anchored at `start`.
    pub fn deadlines(&self, start: Instant) -> (Instant, Instant) {
        (start + self.soft, start + self.hard)
    }
}

const MIN_THINK_MS: u64 = 5;
const MOVE_OVERHEAD_MS: u64 = 20;

/// Budget a move from remaining clock time and increment: a slice of the
/// remaining time plus most of the increment, with a floor so a nearly
/// flagged engine still moves, and a hard limit a few times the soft one.
pub fn choose_think_time(remaining: Duration, increment: Duration) -> TimeBudget {
    let remaining_ms = remaining.as_millis() as u64;
    let usable = remaining_ms.saturating_sub(MOVE_OVERHEAD_MS);
    let soft_ms = (usable / 40 + increment.as_millis() as u64 / 2).max(MIN_THINK_MS);
    // Never commit more than half the clock even with a large increment.
    let soft_ms = soft_ms.min(usable / 2).max(MIN_THINK_MS);
    let hard_ms = (soft_ms * 4).min(usable.max(MIN_THINK_MS));
    TimeBudget {
        soft: Duration::from_millis(soft_ms),
        hard: Duration::from_millis(hard_ms.max(soft_ms)),
    }
}
