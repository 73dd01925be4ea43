//! Recompute/reuse/supersede policy.

use std::time::Duration;

use tracing::debug;

use super::timers::{TimerKind, TimerSet};
use crate::position::LocationFix;

/// Timer durations and policy windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Exit delay once no client holds a reference.
    pub idle_timeout: Duration,
    /// Availability drops to acquiring when no fix arrives within this.
    pub fix_lost_timeout: Duration,
    /// Floor for the recompute interval.
    pub minimum_interval: Duration,
    /// A fix younger than this is republished instead of recomputed.
    pub reuse_window: Duration,
    /// A more accurate fix younger than this beats a new, worse candidate.
    pub fallback_window: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30),
            fix_lost_timeout: Duration::from_secs(30),
            minimum_interval: Duration::from_secs(10),
            reuse_window: Duration::from_secs(30),
            fallback_window: Duration::from_secs(120),
        }
    }
}

impl SchedulerConfig {
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_fix_lost_timeout(mut self, timeout: Duration) -> Self {
        self.fix_lost_timeout = timeout;
        self
    }

    pub fn with_minimum_interval(mut self, interval: Duration) -> Self {
        self.minimum_interval = interval;
        self
    }

    pub fn with_reuse_window(mut self, window: Duration) -> Self {
        self.reuse_window = window;
        self
    }

    pub fn with_fallback_window(mut self, window: Duration) -> Self {
        self.fallback_window = window;
        self
    }
}

/// What a recompute tick should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeDecision {
    /// Positioning is off.
    Disabled,
    /// Compute a fresh fix.
    Recompute,
    /// Republish the current fix unchanged.
    Reuse,
}

/// Timers, current/last fix and change flags.
#[derive(Debug)]
pub struct PositionScheduler {
    config: SchedulerConfig,
    timers: TimerSet,
    cells_changed: bool,
    wlan_changed: bool,
    current: LocationFix,
    last: LocationFix,
}

impl PositionScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            timers: TimerSet::new(),
            cells_changed: false,
            wlan_changed: false,
            current: LocationFix::none(),
            last: LocationFix::none(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    pub fn current(&self) -> &LocationFix {
        &self.current
    }

    pub fn last(&self) -> &LocationFix {
        &self.last
    }

    pub fn mark_cells_changed(&mut self) {
        self.cells_changed = true;
    }

    pub fn mark_wlan_changed(&mut self) {
        self.wlan_changed = true;
    }

    pub fn has_pending_changes(&self) -> bool {
        self.cells_changed || self.wlan_changed
    }

    pub fn clear_changes(&mut self) {
        self.cells_changed = false;
        self.wlan_changed = false;
    }

    // Idle timer

    pub fn arm_idle(&mut self, now_ms: u64) {
        self.timers
            .arm_once(TimerKind::Idle, now_ms, millis(self.config.idle_timeout));
    }

    pub fn disarm_idle(&mut self) {
        self.timers.disarm(TimerKind::Idle);
    }

    // Recompute timer

    pub fn arm_recompute(&mut self, now_ms: u64, interval_ms: u64) {
        debug!(interval_ms, "Arming recompute timer");
        self.timers
            .arm_periodic(TimerKind::Recompute, now_ms, interval_ms);
    }

    pub fn recompute_interval(&self) -> Option<u64> {
        self.timers.period(TimerKind::Recompute)
    }

    /// Disarm the recompute and fix-lost timers.
    pub fn stop(&mut self) {
        self.timers.disarm(TimerKind::Recompute);
        self.timers.disarm(TimerKind::FixLost);
    }

    pub fn minimum_interval_ms(&self) -> u64 {
        millis(self.config.minimum_interval)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pop_next(&mut self, now_ms: u64) -> Option<TimerKind> {
        self.timers.pop_next(now_ms)
    }

    /// Decide what a recompute tick does.
    ///
    /// Pending change flags stay set until [`PositionScheduler::clear_changes`]
    /// is called for a recompute that actually queried or triangulated.
    pub fn decide(&mut self, positioning_active: bool, now_ms: u64) -> RecomputeDecision {
        if !positioning_active {
            return RecomputeDecision::Disabled;
        }

        let stale = !self.current.is_valid()
            || self.current.age_ms(now_ms) > millis(self.config.reuse_window);
        if stale || self.has_pending_changes() {
            debug!(
                stale,
                cells_changed = self.cells_changed,
                wlan_changed = self.wlan_changed,
                "Recomputing position"
            );
            RecomputeDecision::Recompute
        } else {
            RecomputeDecision::Reuse
        }
    }

    /// Pick between a fresh candidate and the current fix.
    ///
    /// The current fix wins only when it is valid, younger than the
    /// fallback window and strictly more accurate than the candidate.
    pub fn supersede(&self, candidate: LocationFix, now_ms: u64) -> LocationFix {
        let current = &self.current;
        if current.is_valid()
            && current.age_ms(now_ms) < millis(self.config.fallback_window)
            && current.accuracy.horizontal < candidate.accuracy.horizontal
        {
            debug!(
                current_accuracy = current.accuracy.horizontal,
                candidate_accuracy = candidate.accuracy.horizontal,
                "Keeping more accurate recent fix"
            );
            *current
        } else {
            candidate
        }
    }

    /// Record a fix as published.
    ///
    /// A valid fix re-arms the fix-lost timer and moves the previous fix
    /// into `last`. A "no fix" clears `last`.
    pub fn publish(&mut self, fix: LocationFix, now_ms: u64) {
        if fix.is_valid() {
            self.timers.arm_once(
                TimerKind::FixLost,
                now_ms,
                millis(self.config.fix_lost_timeout),
            );
            self.last = self.current;
        } else {
            self.last = LocationFix::none();
        }
        self.current = fix;
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_000_000;

    fn scheduler_with(current: Option<LocationFix>) -> PositionScheduler {
        let mut scheduler = PositionScheduler::new(SchedulerConfig::default());
        if let Some(fix) = current {
            scheduler.publish(fix, fix.timestamp_ms);
        }
        scheduler
    }

    #[test]
    fn test_disabled_when_positioning_inactive() {
        let mut scheduler = scheduler_with(None);
        assert_eq!(scheduler.decide(false, NOW), RecomputeDecision::Disabled);
    }

    #[test]
    fn test_recompute_without_fix() {
        let mut scheduler = scheduler_with(None);
        assert_eq!(scheduler.decide(true, NOW), RecomputeDecision::Recompute);
    }

    #[test]
    fn test_reuse_young_fix_without_changes() {
        let mut scheduler = scheduler_with(Some(LocationFix::new(NOW - 5_000, 1.0, 1.0, 9000.0)));
        assert_eq!(scheduler.decide(true, NOW), RecomputeDecision::Reuse);
    }

    #[test]
    fn test_recompute_old_fix() {
        let mut scheduler = scheduler_with(Some(LocationFix::new(NOW - 31_000, 1.0, 1.0, 9000.0)));
        assert_eq!(scheduler.decide(true, NOW), RecomputeDecision::Recompute);
    }

    #[test]
    fn test_pending_changes_force_recompute_until_cleared() {
        let mut scheduler = scheduler_with(Some(LocationFix::new(NOW - 5_000, 1.0, 1.0, 9000.0)));
        scheduler.mark_wlan_changed();
        assert_eq!(scheduler.decide(true, NOW), RecomputeDecision::Recompute);
        assert!(scheduler.has_pending_changes());
        assert_eq!(scheduler.decide(true, NOW), RecomputeDecision::Recompute);

        scheduler.clear_changes();
        assert!(!scheduler.has_pending_changes());
        assert_eq!(scheduler.decide(true, NOW), RecomputeDecision::Reuse);
    }

    #[test]
    fn test_recent_accurate_fix_supersedes_candidate() {
        let current = LocationFix::new(NOW - 10_000, 1.0, 1.0, 2500.0);
        let scheduler = scheduler_with(Some(current));
        let candidate = LocationFix::new(NOW, 2.0, 2.0, 9000.0);
        let chosen = scheduler.supersede(candidate, NOW);
        assert_eq!(chosen.timestamp_ms, current.timestamp_ms);
    }

    #[test]
    fn test_old_fix_does_not_supersede() {
        let current = LocationFix::new(NOW - 130_000, 1.0, 1.0, 2500.0);
        let scheduler = scheduler_with(Some(current));
        let candidate = LocationFix::new(NOW, 2.0, 2.0, 9000.0);
        assert_eq!(scheduler.supersede(candidate, NOW).timestamp_ms, NOW);
    }

    #[test]
    fn test_equal_accuracy_does_not_supersede() {
        let current = LocationFix::new(NOW - 10_000, 1.0, 1.0, 9000.0);
        let scheduler = scheduler_with(Some(current));
        let candidate = LocationFix::new(NOW, 2.0, 2.0, 9000.0);
        assert_eq!(scheduler.supersede(candidate, NOW).timestamp_ms, NOW);
    }

    #[test]
    fn test_publish_tracks_last_and_fix_lost() {
        let mut scheduler = scheduler_with(None);
        let first = LocationFix::new(NOW, 1.0, 1.0, 9000.0);
        scheduler.publish(first, NOW);
        assert_eq!(
            scheduler.timers().deadline(TimerKind::FixLost),
            Some(NOW + 30_000)
        );

        let second = LocationFix::new(NOW + 10_000, 2.0, 2.0, 8000.0);
        scheduler.publish(second, NOW + 10_000);
        assert_eq!(scheduler.last().timestamp_ms, NOW);
        assert_eq!(scheduler.current().timestamp_ms, NOW + 10_000);

        scheduler.publish(LocationFix::none(), NOW + 20_000);
        assert!(!scheduler.last().is_valid());
        assert!(!scheduler.current().is_valid());
        assert_eq!(
            scheduler.timers().deadline(TimerKind::FixLost),
            Some(NOW + 40_000)
        );
    }
}
