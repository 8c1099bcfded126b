use crate::config::ServerConfig;
use crate::relay::{Relay, RelayCommand};
use crate::signaling::SignalingOutput;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use ferry_core::{ClientSignal, PeerId, ServerSignal};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

/// Outbound queues of every open socket, keyed by participant.
#[derive(Default)]
pub struct PeerSockets {
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
}

impl PeerSockets {
    fn push(&self, peer_id: PeerId, msg: &ServerSignal) {
        let Some(peer) = self.peers.get(&peer_id) else {
            warn!(
                "Attempted to send signal to disconnected user {:?}",
                peer_id
            );
            return;
        };

        match serde_json::to_string(msg) {
            Ok(json) => {
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    error!("Failed to send WS message to {:?}: {:?}", peer_id, e);
                }
            }
            Err(e) => error!("Failed to serialize signal message: {}", e),
        }
    }
}

#[async_trait]
impl SignalingOutput for PeerSockets {
    async fn send_signal(&self, peer_id: PeerId, msg: ServerSignal) {
        self.push(peer_id, &msg);
    }
}

/// Handle shared by all socket tasks. Registers sockets and forwards their
/// traffic to the relay actor.
#[derive(Clone)]
pub struct SignalingService {
    sockets: Arc<PeerSockets>,
    relay_tx: mpsc::Sender<RelayCommand>,
    idle_timeout: Duration,
}

impl SignalingService {
    /// Spawns the relay actor and returns a handle to it.
    pub fn start(config: &ServerConfig) -> Self {
        let (relay_tx, relay_rx) = mpsc::channel(256);
        let sockets = Arc::new(PeerSockets::default());

        let relay = Relay::new(config, relay_rx, sockets.clone());
        tokio::spawn(relay.run());

        Self {
            sockets,
            relay_tx,
            idle_timeout: config.idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn add_peer(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        self.sockets.peers.insert(peer_id, tx);
    }

    pub fn remove_peer(&self, peer_id: &PeerId) {
        self.sockets.peers.remove(peer_id);
    }

    pub fn connected_peers(&self) -> usize {
        self.sockets.peers.len()
    }

    /// Asks the relay for a participant slot. Fails with the admission error
    /// when the source address is over its limit.
    pub async fn connect(&self, peer_id: PeerId, addr: IpAddr) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.relay_tx
            .send(RelayCommand::Connect {
                peer_id,
                addr,
                reply,
            })
            .await
            .map_err(|_| anyhow!("relay is not running"))?;

        rx.await.context("relay dropped the admission request")??;
        Ok(())
    }

    pub async fn relay(&self, peer_id: PeerId, signal: ClientSignal) -> Result<()> {
        self.relay_tx
            .send(RelayCommand::Signal { peer_id, signal })
            .await
            .map_err(|_| anyhow!("relay is not running"))
    }

    pub async fn disconnect(&self, peer_id: PeerId) {
        if self
            .relay_tx
            .send(RelayCommand::Disconnect { peer_id })
            .await
            .is_err()
        {
            error!("Relay died before {} could be removed", peer_id);
        }
    }
}
