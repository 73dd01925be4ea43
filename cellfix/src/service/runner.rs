//! The service event loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::dispatch::TokioDispatcher;
use super::handle::{Command, PositionHandle};
use crate::engine::PositionEngine;
use crate::online::OnlineLocator;

/// Why [`PositionService::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// No client for the idle timeout.
    Idle,
    /// The cancellation token fired.
    Cancelled,
}

/// Owns the only [`PositionEngine`] and drives it from one task.
pub struct PositionService {
    engine: PositionEngine,
    rx: mpsc::UnboundedReceiver<Command>,
}

impl PositionService {
    /// Wrap an engine. With a locator, online lookups are spawned as tasks
    /// bounded by `online_timeout`.
    pub fn new(
        mut engine: PositionEngine,
        locator: Option<Arc<dyn OnlineLocator>>,
        online_timeout: Duration,
    ) -> (Self, PositionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(locator) = locator {
            engine.set_dispatcher(Box::new(TokioDispatcher::new(
                locator,
                tx.clone(),
                online_timeout,
            )));
        }
        let handle = PositionHandle::new(tx, engine.event_sender());
        (Self { engine, rx }, handle)
    }

    pub fn engine(&self) -> &PositionEngine {
        &self.engine
    }

    /// Run until the idle timer fires or `cancel` is triggered.
    pub async fn run(mut self, cancel: CancellationToken) -> ExitReason {
        info!("Position service running");

        loop {
            if self.engine.idle_expired() {
                info!("Position service exiting after idle timeout");
                return ExitReason::Idle;
            }

            let wait = self
                .engine
                .next_deadline()
                .map(|deadline| Duration::from_millis(deadline.saturating_sub(self.engine.now_ms())));

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Position service cancelled");
                    return ExitReason::Cancelled;
                }
                command = self.rx.recv() => match command {
                    Some(command) => self.handle(command),
                    // Every sender is gone; nothing can reach the engine.
                    None => {
                        debug!("All handles dropped");
                        return ExitReason::Cancelled;
                    }
                },
                _ = sleep_for(wait) => {
                    self.engine.fire_expired();
                }
            }
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::AddReference(client) => self.engine.add_reference(&client),
            Command::RemoveReference(client) => self.engine.remove_reference(&client),
            Command::ClientVanished(client) => self.engine.client_vanished(&client),
            Command::SetUpdateInterval {
                client,
                interval_ms,
                reply,
            } => {
                let result = self.engine.set_update_interval(&client, interval_ms);
                let _ = reply.send(result);
            }
            Command::GetPosition(reply) => {
                let _ = reply.send(self.engine.position());
            }
            Command::GetStatus(reply) => {
                let _ = reply.send(self.engine.status());
            }
            Command::GetProviderInfo(reply) => {
                let _ = reply.send(self.engine.provider_info());
            }
            Command::CellsChanged(reports) => self.engine.cells_changed(reports),
            Command::WlanChanged(wlans) => self.engine.wlan_changed(wlans),
            Command::SettingsChanged(snapshot) => self.engine.apply_settings(snapshot),
            Command::OnlineResult { generation, result } => {
                self.engine.online_result(generation, result)
            }
        }
    }
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(wait) => tokio::time::sleep(wait).await,
        None => std::future::pending().await,
    }
}
