use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One message on a direct channel.
///
/// Control records travel as text, file content as binary. Chunks carry no
/// sequence number: channels must deliver in order and reliably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

impl Frame {
    pub fn len(&self) -> usize {
        match self {
            Frame::Text(text) => text.len(),
            Frame::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Structured control record preceding a transfer's chunks.
///
/// Wire form: `{"type":"metadata","name":..,"size":..,"totalChunks":..}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControlFrame {
    #[serde(rename_all = "camelCase")]
    Metadata {
        name: String,
        size: u64,
        total_chunks: u64,
    },
}

impl ControlFrame {
    pub fn to_frame(&self) -> serde_json::Result<Frame> {
        serde_json::to_string(self).map(Frame::Text)
    }

    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
