use anyhow::{Context, Result};
use ferry_core::{ClientSignal, PeerId, ServerSignal};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single expected message (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// Raw websocket participant speaking the relay protocol.
pub struct WsTestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTestClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let url = format!("ws://{}/ws", addr);
        let (stream, _) = connect_async(&url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        Ok(Self { stream })
    }

    /// Connects and consumes the greeting, returning the assigned id.
    pub async fn connect_welcomed(addr: SocketAddr) -> Result<(Self, PeerId)> {
        let mut client = Self::connect(addr).await?;
        let peer_id = match client.recv().await? {
            ServerSignal::Welcome { peer_id } => peer_id,
            other => anyhow::bail!("Expected Welcome, got {:?}", other),
        };
        match client.recv().await? {
            ServerSignal::IceConfig { .. } => {}
            other => anyhow::bail!("Expected IceConfig, got {:?}", other),
        }
        Ok((client, peer_id))
    }

    pub async fn send(&mut self, signal: &ClientSignal) -> Result<()> {
        let json = serde_json::to_string(signal)?;
        self.send_raw(&json).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.stream
            .send(Message::Text(text.to_owned()))
            .await
            .context("Failed to send")
    }

    pub async fn ping(&mut self) -> Result<()> {
        self.stream
            .send(Message::Ping(Vec::new()))
            .await
            .context("Failed to ping")
    }

    pub async fn recv(&mut self) -> Result<ServerSignal> {
        let timeout = Duration::from_millis(SIGNAL_TIMEOUT_MS);
        loop {
            let msg = tokio::time::timeout(timeout, self.stream.next())
                .await
                .context("Timeout waiting for signal")?
                .context("Socket closed")??;

            match msg {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(_) => anyhow::bail!("Socket closed by server"),
                _ => continue,
            }
        }
    }

    /// True if the server closes the socket (or it errors) within the timeout.
    pub async fn closed_within(&mut self, timeout_ms: u64) -> bool {
        let deadline = Duration::from_millis(timeout_ms);
        let closed = async {
            loop {
                match self.stream.next().await {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                    Some(Ok(_)) => continue,
                }
            }
        };
        tokio::time::timeout(deadline, closed).await.is_ok()
    }

    /// True only if the server sends a Close frame within the timeout.
    pub async fn close_frame_within(&mut self, timeout_ms: u64) -> bool {
        let deadline = Duration::from_millis(timeout_ms);
        let close_frame = async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Close(_))) => return true,
                    None | Some(Err(_)) => return false,
                    Some(Ok(_)) => continue,
                }
            }
        };
        tokio::time::timeout(deadline, close_frame).await.unwrap_or(false)
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
