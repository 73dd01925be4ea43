//! Explicit timer state.
//!
//! Timers are deadlines in clock milliseconds. Nothing here sleeps; the
//! service loop asks for [`TimerSet::next_deadline`], waits, and then feeds
//! [`TimerSet::pop_next`] back into the engine.

use std::collections::HashMap;
use std::fmt;

/// The three engine timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// No clients: the process may exit.
    Idle,
    /// No new fix for a while: availability drops to acquiring.
    FixLost,
    /// Periodic position recompute.
    Recompute,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerKind::Idle => "idle",
            TimerKind::FixLost => "fix-lost",
            TimerKind::Recompute => "recompute",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timer {
    deadline_ms: u64,
    period_ms: Option<u64>,
}

#[derive(Debug, Default, Clone)]
pub struct TimerSet {
    timers: HashMap<TimerKind, Timer>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a one-shot timer, replacing any existing deadline.
    pub fn arm_once(&mut self, kind: TimerKind, now_ms: u64, after_ms: u64) {
        self.timers.insert(
            kind,
            Timer {
                deadline_ms: now_ms.saturating_add(after_ms),
                period_ms: None,
            },
        );
    }

    /// Arm a periodic timer. The first expiry is one period from now.
    pub fn arm_periodic(&mut self, kind: TimerKind, now_ms: u64, period_ms: u64) {
        let period_ms = period_ms.max(1);
        self.timers.insert(
            kind,
            Timer {
                deadline_ms: now_ms.saturating_add(period_ms),
                period_ms: Some(period_ms),
            },
        );
    }

    pub fn disarm(&mut self, kind: TimerKind) {
        self.timers.remove(&kind);
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.timers.contains_key(&kind)
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<u64> {
        self.timers.get(&kind).map(|t| t.deadline_ms)
    }

    pub fn period(&self, kind: TimerKind) -> Option<u64> {
        self.timers.get(&kind).and_then(|t| t.period_ms)
    }

    /// Earliest deadline over all armed timers.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.values().map(|t| t.deadline_ms).min()
    }

    /// Pop the earliest timer due at `now_ms`.
    ///
    /// A one-shot timer is disarmed. A periodic timer is re-armed one period
    /// after `now_ms`, so a late wakeup fires it once, not once per missed
    /// period. Deadlines are read afresh on every call, so a timer re-armed
    /// by an earlier handler is no longer due.
    pub fn pop_next(&mut self, now_ms: u64) -> Option<TimerKind> {
        let (kind, timer) = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline_ms <= now_ms)
            .min_by_key(|(kind, t)| (t.deadline_ms, **kind))
            .map(|(kind, t)| (*kind, *t))?;

        match timer.period_ms {
            Some(period) => {
                if let Some(timer) = self.timers.get_mut(&kind) {
                    timer.deadline_ms = now_ms.saturating_add(period);
                }
            }
            None => {
                self.timers.remove(&kind);
            }
        }
        Some(kind)
    }
}
