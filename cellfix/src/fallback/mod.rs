//! Online/offline fallback coordination.
//!
//! ```text
//! recompute ──► online active? ──no──────────────────────► triangulate
//!                    │ yes
//!                    ▼
//!               query in flight? ──yes──► no update
//!                    │ no
//!                    ▼
//!               observations? ──none───────────────────────► triangulate
//!                    │
//!                    ▼
//!               dispatch(generation) ... online_result(generation)
//!                                              │ ok      │ error
//!                                              ▼         ▼
//!                                             fix    triangulate
//! ```

use tracing::{debug, info, warn};

use crate::cache::CellResolver;
use crate::cell::CellObservation;
use crate::online::{
    InFlightGuard, LocateRequest, LocationQuery, OnlineDispatch, OnlineError, OnlineFix,
    WlanObservation,
};
use crate::position::LocationFix;
use crate::triangulation::{estimate, Estimate, TriangulationConfig};

/// Inputs for one recompute cycle.
#[derive(Debug, Clone, Copy)]
pub struct RecomputeInput<'a> {
    pub now_ms: u64,
    pub cells: &'a [CellObservation],
    pub wlans: &'a [WlanObservation],
    pub online_active: bool,
    pub wlan_allowed: bool,
}

/// What a recompute produced.
#[derive(Debug, Clone, Copy)]
pub enum RecomputeOutcome {
    /// An online query went out; the answer arrives via `online_result`.
    Dispatched { generation: u64 },
    /// A previous query is still outstanding; nothing to publish.
    AwaitingOnline,
    /// The offline path ran.
    Offline(Estimate),
}

/// What an online result produced.
#[derive(Debug, Clone, Copy)]
pub enum OnlineOutcome {
    /// The result belonged to a superseded or cancelled query.
    Discarded,
    Fix(LocationFix),
    /// The query failed and the offline path ran instead.
    Offline(Estimate),
}

#[derive(Debug, Default)]
pub struct FallbackCoordinator {
    guard: InFlightGuard,
    previous_query: Option<LocationQuery>,
    triangulation: TriangulationConfig,
}

impl FallbackCoordinator {
    pub fn new(triangulation: TriangulationConfig) -> Self {
        Self {
            triangulation,
            ..Default::default()
        }
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.guard.in_flight()
    }

    /// Run one recompute cycle.
    pub fn recompute<R: CellResolver + ?Sized>(
        &mut self,
        input: RecomputeInput<'_>,
        resolver: &mut R,
        dispatcher: Option<&dyn OnlineDispatch>,
    ) -> RecomputeOutcome {
        if input.online_active {
            match dispatcher {
                Some(dispatcher) => {
                    if let Some(outcome) = self.try_online(&input, dispatcher) {
                        return outcome;
                    }
                }
                None => debug!("Online positioning enabled but no locator configured"),
            }
        }
        RecomputeOutcome::Offline(self.offline(input.cells, resolver, input.now_ms))
    }

    fn try_online(
        &mut self,
        input: &RecomputeInput<'_>,
        dispatcher: &dyn OnlineDispatch,
    ) -> Option<RecomputeOutcome> {
        if let Some(generation) = self.guard.in_flight() {
            debug!(generation, "Online query still in flight, skipping recompute");
            return Some(RecomputeOutcome::AwaitingOnline);
        }

        let Some(query) =
            LocationQuery::build(input.now_ms, input.cells, input.wlans, input.wlan_allowed)
        else {
            debug!("Nothing to send to online locator");
            return None;
        };

        let generation = self.guard.try_begin()?;
        let previous = self.previous_query.replace(query.clone());
        debug!(
            generation,
            cells = query.cells.len(),
            wlans = query.wlans.len(),
            "Dispatching online query"
        );
        dispatcher.dispatch(generation, LocateRequest { query, previous });
        Some(RecomputeOutcome::Dispatched { generation })
    }

    /// Accept the answer to an online query.
    pub fn online_result<R: CellResolver + ?Sized>(
        &mut self,
        generation: u64,
        result: Result<OnlineFix, OnlineError>,
        now_ms: u64,
        cells: &[CellObservation],
        resolver: &mut R,
    ) -> OnlineOutcome {
        if !self.guard.complete(generation) {
            debug!(generation, "Discarding stale online result");
            return OnlineOutcome::Discarded;
        }

        match result {
            Ok(fix) => {
                info!(
                    latitude = fix.latitude,
                    longitude = fix.longitude,
                    accuracy = fix.accuracy,
                    "Online position received"
                );
                OnlineOutcome::Fix(LocationFix::new(
                    now_ms,
                    fix.latitude,
                    fix.longitude,
                    fix.accuracy,
                ))
            }
            Err(e) => {
                warn!(error = %e, "Online positioning failed, falling back to offline");
                OnlineOutcome::Offline(self.offline(cells, resolver, now_ms))
            }
        }
    }

    /// Drop any outstanding query; its result will be discarded.
    pub fn reset(&mut self) {
        self.guard.cancel();
    }

    fn offline<R: CellResolver + ?Sized>(
        &self,
        cells: &[CellObservation],
        resolver: &mut R,
        now_ms: u64,
    ) -> Estimate {
        estimate(cells, resolver, now_ms, &self.triangulation)
    }
}
