use crate::transfer::FileData;
use ferry_core::{RoomId, TransferHistory};
use tokio::sync::oneshot;

/// Requests from the UI to the client loop.
#[derive(Debug)]
pub enum ClientCommand {
    CreateRoom,
    JoinRoom(RoomId),
    SelectFile(FileData),
    SendFile,
    Pause,
    Resume,
    History(oneshot::Sender<TransferHistory>),
    Shutdown,
}
