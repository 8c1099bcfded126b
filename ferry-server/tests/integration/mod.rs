
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use ferry_core::{AdmissionError, ClientSignal, PeerId};
use ferry_server::{Relay, RelayCommand, ServerConfig, serve_with_listener};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::Level;

use crate::utils::MockSignalingOutput;

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_relay(config: ServerConfig) -> (mpsc::Sender<RelayCommand>, MockSignalingOutput) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<RelayCommand>(100);
    let signaling = MockSignalingOutput::new();

    let relay = Relay::new(&config, cmd_rx, Arc::new(signaling.clone()));

    tokio::spawn(async move {
        relay.run().await;
    });

    (cmd_tx, signaling)
}

/// Registers a participant with the relay and waits for the verdict.
pub async fn connect_peer(
    cmd_tx: &mpsc::Sender<RelayCommand>,
    addr: IpAddr,
) -> (PeerId, Result<(), AdmissionError>) {
    let peer_id = PeerId::new();
    let (reply, rx) = oneshot::channel();
    cmd_tx
        .send(RelayCommand::Connect {
            peer_id,
            addr,
            reply,
        })
        .await
        .expect("Relay stopped");
    (peer_id, rx.await.expect("Relay dropped reply"))
}

pub async fn send_signal(cmd_tx: &mpsc::Sender<RelayCommand>, peer_id: PeerId, signal: ClientSignal) {
    cmd_tx
        .send(RelayCommand::Signal { peer_id, signal })
        .await
        .expect("Relay stopped");
}

/// Starts a real server on an ephemeral port.
pub async fn spawn_server(config: ServerConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local addr");

    tokio::spawn(async move {
        if let Err(e) = serve_with_listener(listener, config).await {
            tracing::error!("Test server stopped: {:?}", e);
        }
    });

    addr
}
