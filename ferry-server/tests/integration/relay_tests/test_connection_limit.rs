use std::net::{IpAddr, Ipv4Addr};

use ferry_core::{AdmissionError, ClientSignal, RoomId, ServerSignal};
use ferry_server::{RelayCommand, ServerConfig};

use crate::integration::{LOCALHOST, connect_peer, create_test_relay, init_tracing, send_signal};

#[tokio::test]
async fn test_connection_over_per_address_limit_is_refused() {
    init_tracing();

    let config = ServerConfig {
        max_connections_per_ip: 2,
        ..ServerConfig::default()
    };
    let (cmd_tx, signaling) = create_test_relay(config);

    let (a, first) = connect_peer(&cmd_tx, LOCALHOST).await;
    let (b, second) = connect_peer(&cmd_tx, LOCALHOST).await;
    let (_, third) = connect_peer(&cmd_tx, LOCALHOST).await;

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(third, Err(AdmissionError::TooManyConnections { limit: 2 }));

    // Another address is unaffected.
    let (_, other) = connect_peer(&cmd_tx, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 9))).await;
    assert!(other.is_ok());

    // The existing connections keep working.
    send_signal(&cmd_tx, a, ClientSignal::JoinRoom { room_id: RoomId::from("r") }).await;
    send_signal(&cmd_tx, b, ClientSignal::JoinRoom { room_id: RoomId::from("r") }).await;
    send_signal(&cmd_tx, b, ClientSignal::Offer { to: a, sdp: "v=0".into() }).await;
    let offer = signaling
        .wait_for(&a, 1000, |m| matches!(m, ServerSignal::Offer { .. }))
        .await;
    assert_eq!(offer, Some(ServerSignal::Offer { from: b, sdp: "v=0".into() }));
}

#[tokio::test]
async fn test_disconnect_frees_address_slot() {
    init_tracing();

    let config = ServerConfig {
        max_connections_per_ip: 1,
        ..ServerConfig::default()
    };
    let (cmd_tx, _signaling) = create_test_relay(config);

    let (a, first) = connect_peer(&cmd_tx, LOCALHOST).await;
    assert!(first.is_ok());
    let (_, refused) = connect_peer(&cmd_tx, LOCALHOST).await;
    assert!(refused.is_err());

    cmd_tx
        .send(RelayCommand::Disconnect { peer_id: a })
        .await
        .unwrap();

    let (_, again) = connect_peer(&cmd_tx, LOCALHOST).await;
    assert!(again.is_ok());
}
