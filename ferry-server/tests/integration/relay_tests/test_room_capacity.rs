use ferry_core::{ClientSignal, RoomId, ServerSignal};
use ferry_server::ServerConfig;

use crate::integration::{LOCALHOST, connect_peer, create_test_relay, init_tracing, send_signal};

#[tokio::test]
async fn test_full_room_refuses_join_without_touching_members() {
    init_tracing();

    let config = ServerConfig {
        max_users_per_room: 2,
        ..ServerConfig::default()
    };
    let (cmd_tx, signaling) = create_test_relay(config);
    let room_id = RoomId::from("small");

    let (a, _) = connect_peer(&cmd_tx, LOCALHOST).await;
    let (b, _) = connect_peer(&cmd_tx, LOCALHOST).await;
    let (c, _) = connect_peer(&cmd_tx, LOCALHOST).await;

    for peer in [a, b, c] {
        send_signal(&cmd_tx, peer, ClientSignal::JoinRoom { room_id: room_id.clone() }).await;
    }

    let refused = signaling
        .wait_for(&c, 1000, |m| matches!(m, ServerSignal::Error { .. }))
        .await;
    assert!(
        matches!(&refused, Some(ServerSignal::Error { message }) if message.contains("full")),
        "Unexpected refusal: {:?}",
        refused
    );

    // A never hears about C, and C cannot reach A.
    send_signal(&cmd_tx, c, ClientSignal::Offer { to: a, sdp: "v=0".into() }).await;
    send_signal(&cmd_tx, b, ClientSignal::Offer { to: a, sdp: "v=0 marker".into() }).await;
    signaling
        .wait_for(&a, 1000, |m| matches!(m, ServerSignal::Offer { .. }))
        .await
        .expect("Marker not delivered");

    let a_signals = signaling.signals_for(&a).await;
    assert_eq!(
        a_signals
            .iter()
            .filter(|m| matches!(m, ServerSignal::PeerJoined { .. }))
            .collect::<Vec<_>>(),
        vec![&ServerSignal::PeerJoined { peer_id: b }]
    );
    assert!(!a_signals.contains(&ServerSignal::Offer { from: c, sdp: "v=0".into() }));
}

#[tokio::test]
async fn test_invalid_room_id_is_reported() {
    init_tracing();

    let config = ServerConfig {
        max_room_id_len: 4,
        ..ServerConfig::default()
    };
    let (cmd_tx, signaling) = create_test_relay(config);
    let (a, _) = connect_peer(&cmd_tx, LOCALHOST).await;

    send_signal(&cmd_tx, a, ClientSignal::JoinRoom { room_id: RoomId("toolong".into()) }).await;

    let refused = signaling
        .wait_for(&a, 1000, |m| matches!(m, ServerSignal::Error { .. }))
        .await;
    assert!(matches!(refused, Some(ServerSignal::Error { message }) if message.contains("invalid room id")));
}
