//! Timers and the recompute/reuse/supersede policy.
//!
//! ```text
//!   Idle ──────── armed while no client holds a reference
//!   FixLost ───── re-armed on every valid fix
//!   Recompute ─── periodic at max(minimum, min(requested intervals))
//!
//!   recompute tick:
//!     disabled?                      -> nothing
//!     no fix | fix too old | changes -> recompute (online or offline)
//!     otherwise                      -> republish current fix
//! ```

mod policy;
mod timers;

pub use policy::{PositionScheduler, RecomputeDecision, SchedulerConfig};
pub use timers::{TimerKind, TimerSet};
