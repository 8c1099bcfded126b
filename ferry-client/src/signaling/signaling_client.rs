use anyhow::{Context, Result};
use ferry_core::{ClientSignal, ServerSignal};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket connection to the relay.
///
/// Outgoing signals are queued to a sender task; incoming ones are parsed by a
/// receiver task and delivered on the channel returned from [`connect`].
/// The incoming channel closes when the socket does. The sender task also
/// pings every `keepalive` so the relay never sees the connection as idle.
///
/// [`connect`]: SignalingClient::connect
#[derive(Clone)]
pub struct SignalingClient {
    tx: mpsc::UnboundedSender<Message>,
}

impl SignalingClient {
    pub async fn connect(
        url: &str,
        keepalive: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ServerSignal>)> {
        info!("Connecting to signaling server: {}", url);

        let (ws_stream, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;

        info!("Connected to signaling server");

        let (write, read) = ws_stream.split();
        let (tx, rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::sender_task(write, rx, keepalive));
        tokio::spawn(Self::receiver_task(read, signal_tx));

        Ok((Self { tx }, signal_rx))
    }

    pub fn send(&self, signal: &ClientSignal) -> Result<()> {
        let json = serde_json::to_string(signal)?;
        self.tx
            .send(Message::Text(json))
            .context("Signaling connection closed")
    }

    pub fn close(&self) {
        let _ = self.tx.send(Message::Close(None));
    }

    async fn sender_task(
        mut write: SplitSink<WsStream, Message>,
        mut rx: mpsc::UnboundedReceiver<Message>,
        keepalive: Duration,
    ) {
        let mut ping = tokio::time::interval_at(Instant::now() + keepalive, keepalive);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let msg = tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
                _ = ping.tick() => Message::Ping(Vec::new()),
            };

            let closing = matches!(msg, Message::Close(_));
            if let Err(e) = write.send(msg).await {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
            if closing {
                break;
            }
        }

        debug!("Sender task terminated");
    }

    async fn receiver_task(
        mut read: SplitStream<WsStream>,
        signal_tx: mpsc::UnboundedSender<ServerSignal>,
    ) {
        while let Some(msg_result) = read.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerSignal>(&text) {
                    Ok(signal) => {
                        if signal_tx.send(signal).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Failed to parse server signal: {}", e),
                },
                Ok(Message::Close(_)) => {
                    info!("WebSocket connection closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        debug!("Receiver task terminated");
    }
}
