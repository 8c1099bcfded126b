use ferry_core::{ClientSignal, RoomId, ServerSignal};
use ferry_server::ServerConfig;

use crate::integration::{LOCALHOST, connect_peer, create_test_relay, init_tracing, send_signal};

#[tokio::test]
async fn test_join_notifies_existing_members() {
    init_tracing();

    let (cmd_tx, signaling) = create_test_relay(ServerConfig::default());
    let room_id = RoomId::from("abc123");

    let (a, admitted) = connect_peer(&cmd_tx, LOCALHOST).await;
    admitted.expect("First peer refused");
    let (b, admitted) = connect_peer(&cmd_tx, LOCALHOST).await;
    admitted.expect("Second peer refused");

    send_signal(&cmd_tx, a, ClientSignal::JoinRoom { room_id: room_id.clone() }).await;
    send_signal(&cmd_tx, b, ClientSignal::JoinRoom { room_id: room_id.clone() }).await;

    let joined = signaling
        .wait_for(&b, 1000, |m| matches!(m, ServerSignal::RoomJoined { .. }))
        .await;
    assert_eq!(
        joined,
        Some(ServerSignal::RoomJoined {
            room_id: room_id.clone(),
            peer_count: 2
        })
    );

    // The existing member learns about the newcomer...
    let notified = signaling
        .wait_for(&a, 1000, |m| matches!(m, ServerSignal::PeerJoined { .. }))
        .await;
    assert_eq!(notified, Some(ServerSignal::PeerJoined { peer_id: b }));

    // ...but the newcomer is never told about existing members.
    let b_signals = signaling.signals_for(&b).await;
    assert!(
        !b_signals
            .iter()
            .any(|m| matches!(m, ServerSignal::PeerJoined { .. })),
        "Newcomer should not receive PeerJoined: {:?}",
        b_signals
    );
}

#[tokio::test]
async fn test_connect_is_greeted_with_id_and_ice_config() {
    init_tracing();

    let config = ServerConfig::default();
    let ice_servers = config.ice_servers.clone();
    let (cmd_tx, signaling) = create_test_relay(config);

    let (peer, admitted) = connect_peer(&cmd_tx, LOCALHOST).await;
    admitted.expect("Peer refused");

    signaling
        .wait_for(&peer, 1000, |m| matches!(m, ServerSignal::IceConfig { .. }))
        .await
        .expect("No IceConfig");

    assert_eq!(
        signaling.signals_for(&peer).await,
        vec![
            ServerSignal::Welcome { peer_id: peer },
            ServerSignal::IceConfig { ice_servers },
        ]
    );
}
