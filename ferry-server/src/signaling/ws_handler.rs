use crate::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use ferry_core::{ClientSignal, PeerId, ServerSignal};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How long a queued Close frame gets to reach an idle client.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, service))
}

async fn handle_socket(socket: WebSocket, addr: SocketAddr, service: SignalingService) {
    let peer_id = PeerId::new();
    info!("New WebSocket connection from {}: {:?}", addr, peer_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let close_tx = tx.clone();

    service.add_peer(peer_id, tx);

    if let Err(e) = service.connect(peer_id, addr.ip()).await {
        service.remove_peer(&peer_id);
        let refusal = ServerSignal::Error {
            message: e.to_string(),
        };
        if let Ok(json) = serde_json::to_string(&refusal) {
            let _ = sender.send(Message::Text(json.into())).await;
        }
        let _ = sender.send(Message::Close(None)).await;
        info!("Connection from {} refused: {}", addr, e);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sender.send(msg).await.is_err() || closing {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let idle_timeout = service.idle_timeout();

        // Resolves to true when the connection timed out as idle.
        async move {
            loop {
                let msg = match tokio::time::timeout(idle_timeout, receiver.next()).await {
                    Ok(Some(Ok(msg))) => msg,
                    Ok(_) => return false,
                    Err(_) => {
                        info!("Closing idle connection {:?}", peer_id);
                        let _ = close_tx.send(Message::Close(None));
                        return true;
                    }
                };

                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientSignal>(&text) {
                        Ok(signal) => {
                            if service.relay(peer_id, signal).await.is_err() {
                                return false;
                            }
                        }
                        Err(e) => warn!("Invalid ClientSignal from {:?}: {}", peer_id, e),
                    },
                    Message::Binary(data) => {
                        debug!("Ignoring {} binary bytes from {:?}", data.len(), peer_id)
                    }
                    Message::Close(_) => return false,
                    // Ping and Pong only count as activity.
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        idle = (&mut recv_task) => {
            let flushing = matches!(idle, Ok(true));
            if !flushing
                || tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, &mut send_task)
                    .await
                    .is_err()
            {
                send_task.abort();
            }
        }
    };

    service.disconnect(peer_id).await;
    service.remove_peer(&peer_id);
    info!("WebSocket disconnected: {:?}", peer_id);
}
