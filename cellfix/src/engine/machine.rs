//! The position engine state machine.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::config::EngineConfig;
use super::events::{EngineEvent, ProviderInfo};
use crate::cache::{CacheStats, CellLocationCache, ResolutionCache};
use crate::cell::{observations_from_reports, CellObservation, RawCellReport};
use crate::dataset::CellLocationSource;
use crate::fallback::{FallbackCoordinator, OnlineOutcome, RecomputeInput, RecomputeOutcome};
use crate::online::{OnlineDispatch, OnlineError, OnlineFix, WlanObservation};
use crate::position::{LocationFix, PositionReport};
use crate::scheduler::{PositionScheduler, RecomputeDecision, TimerKind};
use crate::session::{ClientId, SessionError, SessionRegistry};
use crate::settings::{EngineSettings, SettingsSnapshot};
use crate::status::{Status, StatusMachine};
use crate::time::Clock;
use crate::triangulation::Estimate;

/// Single-owner engine driving sessions, timers and fixes.
///
/// Every method takes `&mut self`; the service loop serialises all calls.
/// Time comes from the injected [`Clock`], and timers only fire through
/// [`PositionEngine::fire_expired`] or [`PositionEngine::on_timer`].
pub struct PositionEngine {
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
    sessions: SessionRegistry,
    scheduler: PositionScheduler,
    status: StatusMachine,
    fallback: FallbackCoordinator,
    cache: CellLocationCache<Arc<dyn CellLocationSource>>,
    dispatcher: Option<Box<dyn OnlineDispatch>>,
    raw_cells: Vec<RawCellReport>,
    wlans: Vec<WlanObservation>,
    started: bool,
    idle_expired: bool,
    events: broadcast::Sender<EngineEvent>,
}

impl PositionEngine {
    /// Create an engine with no clients. The idle timer starts immediately.
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn CellLocationSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        let mut scheduler = PositionScheduler::new(config.scheduler);
        scheduler.arm_idle(clock.now_ms());

        Self {
            clock,
            settings: EngineSettings::default(),
            sessions: SessionRegistry::new(),
            scheduler,
            status: StatusMachine::new(),
            fallback: FallbackCoordinator::new(config.triangulation),
            cache: CellLocationCache::new(source),
            dispatcher: None,
            raw_cells: Vec::new(),
            wlans: Vec::new(),
            started: false,
            idle_expired: false,
            events,
        }
    }

    /// Start with these settings instead of everything disabled.
    pub fn with_settings(mut self, snapshot: SettingsSnapshot) -> Self {
        self.settings = EngineSettings::from_snapshot(&snapshot);
        self
    }

    /// Replace the default never-evicting cache strategy.
    pub fn with_cache_strategy(mut self, strategy: Box<dyn ResolutionCache>) -> Self {
        let source = self.cache.source().clone();
        self.cache = CellLocationCache::with_strategy(source, strategy);
        self
    }

    /// Install the online dispatcher. Without one, recomputes stay offline.
    pub fn set_dispatcher(&mut self, dispatcher: Box<dyn OnlineDispatch>) {
        self.dispatcher = Some(dispatcher);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Sender side of the event channel, for handing out subscriptions.
    pub fn event_sender(&self) -> broadcast::Sender<EngineEvent> {
        self.events.clone()
    }

    /// Current time according to the engine clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn position(&self) -> PositionReport {
        PositionReport::from(self.scheduler.current())
    }

    pub fn current_fix(&self) -> &LocationFix {
        self.scheduler.current()
    }

    pub fn last_fix(&self) -> &LocationFix {
        self.scheduler.last()
    }

    pub fn status(&self) -> Status {
        self.status.current()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::default()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_timer_armed(&self, kind: TimerKind) -> bool {
        self.scheduler.timers().is_armed(kind)
    }

    /// Period of the recompute timer while positioning runs.
    pub fn recompute_interval_ms(&self) -> Option<u64> {
        self.scheduler.recompute_interval()
    }

    /// Earliest pending timer deadline in clock milliseconds.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// True once the idle timer fired with no clients connected.
    pub fn idle_expired(&self) -> bool {
        self.idle_expired
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // =========================================================================
    // Client sessions
    // =========================================================================

    pub fn add_reference(&mut self, client: &ClientId) {
        if self.sessions.add_reference(client) {
            self.scheduler.disarm_idle();
            self.idle_expired = false;
        }
        self.start_if_needed();
    }

    pub fn remove_reference(&mut self, client: &ClientId) {
        let outcome = self.sessions.remove_reference(client);
        if outcome.redundant {
            return;
        }
        self.after_removal(outcome.now_empty);
    }

    /// A client disconnected without releasing its references.
    pub fn client_vanished(&mut self, client: &ClientId) {
        let known = self.sessions.get(client).is_some();
        let now_empty = self.sessions.client_vanished(client);
        if known {
            self.after_removal(now_empty);
        }
    }

    fn after_removal(&mut self, now_empty: bool) {
        if now_empty {
            debug!("No clients left, arming idle timer");
            self.scheduler.arm_idle(self.clock.now_ms());
        }
        self.stop_if_needed();
        if self.started {
            self.refresh_interval();
        }
    }

    pub fn set_update_interval(
        &mut self,
        client: &ClientId,
        interval_ms: u64,
    ) -> Result<(), SessionError> {
        self.sessions.set_requested_interval(client, interval_ms)?;
        if self.started {
            let interval = self.effective_interval_ms();
            self.scheduler.arm_recompute(self.clock.now_ms(), interval);
        }
        Ok(())
    }

    fn effective_interval_ms(&self) -> u64 {
        self.sessions
            .effective_interval_ms(self.scheduler.minimum_interval_ms())
    }

    fn refresh_interval(&mut self) {
        let interval = self.effective_interval_ms();
        if self.scheduler.recompute_interval() != Some(interval) {
            self.scheduler.arm_recompute(self.clock.now_ms(), interval);
        }
    }

    // =========================================================================
    // Observations and settings
    // =========================================================================

    pub fn cells_changed(&mut self, reports: Vec<RawCellReport>) {
        debug!(cells = reports.len(), "Cells changed");
        self.raw_cells = reports;
        self.scheduler.mark_cells_changed();
    }

    pub fn wlan_changed(&mut self, wlans: Vec<WlanObservation>) {
        debug!(access_points = wlans.len(), "WLAN changed");
        self.wlans = wlans;
        self.scheduler.mark_wlan_changed();
    }

    pub fn apply_settings(&mut self, snapshot: SettingsSnapshot) {
        let settings = EngineSettings::from_snapshot(&snapshot);
        if settings == self.settings {
            return;
        }

        let was_active = self.settings.positioning_active();
        if settings.cell_data_allowed != self.settings.cell_data_allowed
            || settings.wlan_data_allowed != self.settings.wlan_data_allowed
        {
            self.scheduler.mark_cells_changed();
        }
        self.settings = settings;
        info!(
            positioning = settings.positioning_active(),
            online = settings.online_active(),
            cell_data = settings.cell_data_allowed,
            wlan_data = settings.wlan_data_allowed,
            "Settings changed"
        );

        if was_active && !settings.positioning_active() {
            self.publish(LocationFix::none());
            self.stop_if_needed();
        } else {
            self.start_if_needed();
        }
    }

    fn observations(&self) -> Vec<CellObservation> {
        if self.settings.cell_data_allowed {
            observations_from_reports(&self.raw_cells)
        } else {
            Vec::new()
        }
    }

    // =========================================================================
    // Start / stop
    // =========================================================================

    fn start_if_needed(&mut self) {
        if self.started || self.sessions.is_empty() || !self.settings.positioning_active() {
            return;
        }
        self.started = true;
        let interval = self.effective_interval_ms();
        info!(interval_ms = interval, "Starting positioning");
        self.scheduler.arm_recompute(self.clock.now_ms(), interval);
        self.recompute();
    }

    fn stop_if_needed(&mut self) {
        if !self.started || (self.settings.positioning_active() && !self.sessions.is_empty()) {
            return;
        }
        self.started = false;
        info!("Stopping positioning");
        self.scheduler.stop();
        self.fallback.reset();
        if let Some(status) = self.status.stopped() {
            self.emit(EngineEvent::StatusChanged(status));
        }
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Fire every timer due at the current clock time.
    pub fn fire_expired(&mut self) -> Vec<TimerKind> {
        let now_ms = self.clock.now_ms();
        let mut fired = Vec::new();
        while let Some(kind) = self.scheduler.pop_next(now_ms) {
            self.on_timer(kind);
            fired.push(kind);
        }
        fired
    }

    pub fn on_timer(&mut self, kind: TimerKind) {
        debug!(timer = %kind, "Timer fired");
        match kind {
            TimerKind::Idle => {
                if self.sessions.is_empty() {
                    info!("Idle timeout, no clients");
                    self.idle_expired = true;
                    self.emit(EngineEvent::IdleTimeout);
                }
            }
            TimerKind::FixLost => {
                if let Some(status) = self.status.fix_lost() {
                    self.emit(EngineEvent::StatusChanged(status));
                }
            }
            TimerKind::Recompute => self.recompute(),
        }
    }

    // =========================================================================
    // Fixes
    // =========================================================================

    fn recompute(&mut self) {
        let now_ms = self.clock.now_ms();
        match self
            .scheduler
            .decide(self.settings.positioning_active(), now_ms)
        {
            RecomputeDecision::Disabled => {}
            RecomputeDecision::Reuse => {
                debug!("Reusing current fix");
                let current = *self.scheduler.current();
                self.publish(current);
            }
            RecomputeDecision::Recompute => {
                let cells = self.observations();
                let input = RecomputeInput {
                    now_ms,
                    cells: &cells,
                    wlans: &self.wlans,
                    online_active: self.settings.online_active(),
                    wlan_allowed: self.settings.wlan_data_allowed,
                };
                let outcome =
                    self.fallback
                        .recompute(input, &mut self.cache, self.dispatcher.as_deref());
                match outcome {
                    RecomputeOutcome::AwaitingOnline => {
                        debug!("Online query in flight, keeping changes pending");
                    }
                    RecomputeOutcome::Dispatched { .. } => self.scheduler.clear_changes(),
                    RecomputeOutcome::Offline(estimate) => {
                        self.scheduler.clear_changes();
                        self.accept_estimate(estimate);
                    }
                }
            }
        }
    }

    /// Deliver the result of an online query dispatched earlier.
    pub fn online_result(&mut self, generation: u64, result: Result<OnlineFix, OnlineError>) {
        let now_ms = self.clock.now_ms();
        let cells = self.observations();
        match self
            .fallback
            .online_result(generation, result, now_ms, &cells, &mut self.cache)
        {
            OnlineOutcome::Discarded => {}
            OnlineOutcome::Fix(fix) => self.accept_candidate(fix),
            OnlineOutcome::Offline(estimate) => self.accept_estimate(estimate),
        }
    }

    fn accept_estimate(&mut self, estimate: Estimate) {
        match estimate {
            Estimate::Fix(fix) => self.accept_candidate(fix),
            Estimate::InsufficientData => debug!("Insufficient data, keeping previous fix"),
        }
    }

    fn accept_candidate(&mut self, candidate: LocationFix) {
        let chosen = self.scheduler.supersede(candidate, self.clock.now_ms());
        self.publish(chosen);
    }

    fn publish(&mut self, fix: LocationFix) {
        self.scheduler.publish(fix, self.clock.now_ms());
        if fix.is_valid() {
            if let Some(status) = self.status.fix_published() {
                self.emit(EngineEvent::StatusChanged(status));
            }
        }
        debug!(fix = %fix, "Publishing position");
        self.emit(EngineEvent::PositionChanged(PositionReport::from(&fix)));
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for PositionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionEngine")
            .field("settings", &self.settings)
            .field("sessions", &self.sessions.len())
            .field("started", &self.started)
            .field("status", &self.status.current())
            .finish()
    }
}
