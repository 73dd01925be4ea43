//! Single in-flight query tracking.

/// Allows one online query at a time and tags each with a generation.
///
/// A result is accepted only if it carries the generation of the query
/// currently in flight. Cancelling (e.g. when positioning stops) makes any
/// outstanding result stale.
#[derive(Debug, Default)]
pub struct InFlightGuard {
    next_generation: u64,
    in_flight: Option<u64>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new query. Returns `None` while another is in flight.
    pub fn try_begin(&mut self) -> Option<u64> {
        if self.in_flight.is_some() {
            return None;
        }
        self.next_generation += 1;
        self.in_flight = Some(self.next_generation);
        self.in_flight
    }

    /// Finish a query. Returns false for stale generations.
    pub fn complete(&mut self, generation: u64) -> bool {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.in_flight = None;
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }
}
