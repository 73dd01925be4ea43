//! Provider availability state machine.
//!
//! ```text
//!                 fix published
//!   Unavailable ─────────────────► Available
//!        ▲                          │    ▲
//!        │ stop                     │    │ fix published
//!        │                 fix lost ▼    │
//!        └──────────────────────── Acquiring
//! ```
//!
//! Every transition method returns the new status only when it actually
//! changed, so callers notify exactly once per change.

use std::fmt;

use serde::Serialize;
use tracing::debug;

/// Provider availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Status {
    #[default]
    Unavailable,
    Acquiring,
    Available,
}

impl Status {
    /// Numeric code used on the client protocol.
    pub fn code(self) -> i32 {
        match self {
            Status::Unavailable => 1,
            Status::Acquiring => 2,
            Status::Available => 3,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Unavailable => "unavailable",
            Status::Acquiring => "acquiring",
            Status::Available => "available",
        };
        f.write_str(name)
    }
}

/// Tracks the current [`Status`].
#[derive(Debug, Default)]
pub struct StatusMachine {
    current: Status,
}

impl StatusMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Status {
        self.current
    }

    /// A non-zero fix was published.
    pub fn fix_published(&mut self) -> Option<Status> {
        self.transition(Status::Available)
    }

    /// The fix-lost timer fired. Only leaves `Available`.
    pub fn fix_lost(&mut self) -> Option<Status> {
        if self.current == Status::Available {
            self.transition(Status::Acquiring)
        } else {
            None
        }
    }

    /// Positioning stopped or was disabled.
    pub fn stopped(&mut self) -> Option<Status> {
        self.transition(Status::Unavailable)
    }

    fn transition(&mut self, to: Status) -> Option<Status> {
        if self.current == to {
            return None;
        }
        debug!(from = %self.current, to = %to, "Status changed");
        self.current = to;
        Some(to)
    }
}
