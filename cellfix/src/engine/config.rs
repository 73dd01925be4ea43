//! Engine configuration.

use std::time::Duration;

use crate::scheduler::SchedulerConfig;
use crate::triangulation::TriangulationConfig;

/// Default bound on a single online lookup.
pub const DEFAULT_ONLINE_TIMEOUT: Duration = Duration::from_secs(15);

/// Capacity of the event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    pub triangulation: TriangulationConfig,
    pub online_timeout: Duration,
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            triangulation: TriangulationConfig::default(),
            online_timeout: DEFAULT_ONLINE_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_triangulation(mut self, triangulation: TriangulationConfig) -> Self {
        self.triangulation = triangulation;
        self
    }

    pub fn with_online_timeout(mut self, timeout: Duration) -> Self {
        self.online_timeout = timeout;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
