//! Cloneable handle for talking to a running [`PositionService`](super::PositionService).

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::cell::RawCellReport;
use crate::engine::{EngineEvent, ProviderInfo};
use crate::online::{OnlineError, OnlineFix, WlanObservation};
use crate::position::PositionReport;
use crate::session::{ClientId, SessionError};
use crate::settings::SettingsSnapshot;
use crate::status::Status;

/// Errors from [`PositionHandle`] calls.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Position service is not running")]
    Closed,

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Messages into the service loop.
#[derive(Debug)]
pub(crate) enum Command {
    AddReference(ClientId),
    RemoveReference(ClientId),
    ClientVanished(ClientId),
    SetUpdateInterval {
        client: ClientId,
        interval_ms: u64,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    GetPosition(oneshot::Sender<PositionReport>),
    GetStatus(oneshot::Sender<Status>),
    GetProviderInfo(oneshot::Sender<ProviderInfo>),
    CellsChanged(Vec<RawCellReport>),
    WlanChanged(Vec<WlanObservation>),
    SettingsChanged(SettingsSnapshot),
    OnlineResult {
        generation: u64,
        result: Result<OnlineFix, OnlineError>,
    },
}

/// Client-side access to the position service.
///
/// Notifications are fire-and-forget; queries wait for the loop to answer.
#[derive(Debug, Clone)]
pub struct PositionHandle {
    tx: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<EngineEvent>,
}

impl PositionHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Command>,
        events: broadcast::Sender<EngineEvent>,
    ) -> Self {
        Self { tx, events }
    }

    fn send(&self, command: Command) -> Result<(), ServiceError> {
        self.tx.send(command).map_err(|_| ServiceError::Closed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply))?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub fn add_reference(&self, client: impl Into<ClientId>) -> Result<(), ServiceError> {
        self.send(Command::AddReference(client.into()))
    }

    pub fn remove_reference(&self, client: impl Into<ClientId>) -> Result<(), ServiceError> {
        self.send(Command::RemoveReference(client.into()))
    }

    pub fn client_vanished(&self, client: impl Into<ClientId>) -> Result<(), ServiceError> {
        self.send(Command::ClientVanished(client.into()))
    }

    /// Request an update interval. Fails with [`ServiceError::Session`] if
    /// the client holds no reference.
    pub async fn set_update_interval(
        &self,
        client: impl Into<ClientId>,
        interval_ms: u64,
    ) -> Result<(), ServiceError> {
        let client = client.into();
        self.request(|reply| Command::SetUpdateInterval {
            client,
            interval_ms,
            reply,
        })
        .await?
        .map_err(ServiceError::from)
    }

    pub async fn get_position(&self) -> Result<PositionReport, ServiceError> {
        self.request(Command::GetPosition).await
    }

    pub async fn get_status(&self) -> Result<Status, ServiceError> {
        self.request(Command::GetStatus).await
    }

    pub async fn provider_info(&self) -> Result<ProviderInfo, ServiceError> {
        self.request(Command::GetProviderInfo).await
    }

    pub fn cells_changed(&self, reports: Vec<RawCellReport>) -> Result<(), ServiceError> {
        self.send(Command::CellsChanged(reports))
    }

    pub fn wlan_changed(&self, wlans: Vec<WlanObservation>) -> Result<(), ServiceError> {
        self.send(Command::WlanChanged(wlans))
    }

    pub fn settings_changed(&self, snapshot: SettingsSnapshot) -> Result<(), ServiceError> {
        self.send(Command::SettingsChanged(snapshot))
    }

    /// Subscribe to position, status and idle events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}
