//! Runs online lookups as tokio tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use super::handle::Command;
use crate::online::{LocateRequest, OnlineDispatch, OnlineError, OnlineLocator};

/// Spawns each lookup and posts the result back into the service loop.
pub(crate) struct TokioDispatcher {
    locator: Arc<dyn OnlineLocator>,
    tx: mpsc::UnboundedSender<Command>,
    timeout: Duration,
}

impl TokioDispatcher {
    pub(crate) fn new(
        locator: Arc<dyn OnlineLocator>,
        tx: mpsc::UnboundedSender<Command>,
        timeout: Duration,
    ) -> Self {
        Self {
            locator,
            tx,
            timeout,
        }
    }
}

impl OnlineDispatch for TokioDispatcher {
    fn dispatch(&self, generation: u64, request: LocateRequest) {
        let locator = Arc::clone(&self.locator);
        let tx = self.tx.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, locator.locate(request)).await {
                Ok(result) => result,
                Err(_) => Err(OnlineError::Timeout(timeout)),
            };
            debug!(generation, ok = result.is_ok(), "Online lookup finished");
            // The loop may have exited already.
            let _ = tx.send(Command::OnlineResult { generation, result });
        });
    }
}
