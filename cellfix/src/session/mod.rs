//! Client session registry.
//!
//! Clients register interest with reference counting and may request an
//! update interval. The registry only tracks state; starting and stopping
//! positioning in response is up to the engine.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

/// Identity of a connected client (e.g. a bus name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Protocol usage errors. These never change state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("client {0} has no active session; call AddReference first")]
    NoActiveSession(ClientId),
}

/// Per-client state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientSession {
    pub reference_count: u32,
    /// Requested update interval in milliseconds, zero for no preference.
    pub update_interval_ms: u64,
}

/// Result of [`SessionRegistry::remove_reference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// The client held no reference; nothing changed.
    pub redundant: bool,
    /// The last session just went away.
    pub now_empty: bool,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ClientId, ClientSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn get(&self, client: &ClientId) -> Option<&ClientSession> {
        self.sessions.get(client)
    }

    /// Add one reference. Returns true if there were no sessions before.
    pub fn add_reference(&mut self, client: &ClientId) -> bool {
        let was_empty = self.sessions.is_empty();
        let session = self.sessions.entry(client.clone()).or_default();
        session.reference_count += 1;
        debug!(client = %client, references = session.reference_count, "Added reference");
        was_empty
    }

    /// Drop one reference, removing the session when it reaches zero.
    pub fn remove_reference(&mut self, client: &ClientId) -> RemoveOutcome {
        let Some(session) = self.sessions.get_mut(client) else {
            warn!(client = %client, "Unbalanced RemoveReference: client has no references");
            return RemoveOutcome {
                redundant: true,
                now_empty: false,
            };
        };

        session.reference_count = session.reference_count.saturating_sub(1);
        debug!(client = %client, references = session.reference_count, "Removed reference");
        if session.reference_count == 0 {
            self.sessions.remove(client);
        }
        RemoveOutcome {
            redundant: false,
            now_empty: self.sessions.is_empty(),
        }
    }

    /// Forget a client that disconnected. Returns true if the last session
    /// just went away.
    pub fn client_vanished(&mut self, client: &ClientId) -> bool {
        if self.sessions.remove(client).is_some() {
            debug!(client = %client, "Client vanished");
            self.sessions.is_empty()
        } else {
            false
        }
    }

    /// Store a requested update interval for an active client.
    pub fn set_requested_interval(
        &mut self,
        client: &ClientId,
        interval_ms: u64,
    ) -> Result<(), SessionError> {
        match self.sessions.get_mut(client) {
            Some(session) => {
                session.update_interval_ms = interval_ms;
                Ok(())
            }
            None => {
                warn!(client = %client, "SetOptions without an active session");
                Err(SessionError::NoActiveSession(client.clone()))
            }
        }
    }

    /// Effective recompute interval: the smallest non-zero request, but
    /// never below `minimum_ms`. Falls back to `minimum_ms` with no requests.
    pub fn effective_interval_ms(&self, minimum_ms: u64) -> u64 {
        let mut smallest: Option<u64> = None;
        for (client, session) in &self.sessions {
            if session.reference_count == 0 {
                warn!(client = %client, "Ignoring session with zero references");
                continue;
            }
            if session.update_interval_ms == 0 {
                continue;
            }
            smallest = Some(match smallest {
                Some(current) => current.min(session.update_interval_ms),
                None => session.update_interval_ms,
            });
        }
        smallest.map_or(minimum_ms, |ms| ms.max(minimum_ms))
    }
}
