use crate::client::ClientCommand;
use crate::transfer::FileData;
use anyhow::{Context, Result};
use ferry_core::{RoomId, TransferHistory};
use tokio::sync::{mpsc, oneshot};

/// Cheap, cloneable front door to a running client.
#[derive(Clone)]
pub struct ClientHandle {
    command_tx: mpsc::Sender<ClientCommand>,
}

impl ClientHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<ClientCommand>) -> Self {
        Self { command_tx }
    }

    async fn send(&self, cmd: ClientCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .ok()
            .context("Client has shut down")
    }

    /// Joins a freshly generated room. The id arrives in `ClientEvent::RoomJoined`.
    pub async fn create_room(&self) -> Result<()> {
        self.send(ClientCommand::CreateRoom).await
    }

    pub async fn join_room(&self, room_id: impl Into<RoomId>) -> Result<()> {
        self.send(ClientCommand::JoinRoom(room_id.into())).await
    }

    pub async fn select_file(&self, file: FileData) -> Result<()> {
        self.send(ClientCommand::SelectFile(file)).await
    }

    /// Sends the selected file to every peer with an open channel.
    pub async fn send_file(&self) -> Result<()> {
        self.send(ClientCommand::SendFile).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(ClientCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(ClientCommand::Resume).await
    }

    pub async fn history(&self) -> Result<TransferHistory> {
        let (reply, rx) = oneshot::channel();
        self.send(ClientCommand::History(reply)).await?;
        rx.await.context("Client dropped history request")
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(ClientCommand::Shutdown).await
    }
}
