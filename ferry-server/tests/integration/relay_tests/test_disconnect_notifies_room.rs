use ferry_core::{ClientSignal, RoomId, ServerSignal};
use ferry_server::{RelayCommand, ServerConfig};

use crate::integration::{LOCALHOST, connect_peer, create_test_relay, init_tracing, send_signal};

#[tokio::test]
async fn test_disconnect_notifies_remaining_members() {
    init_tracing();

    let (cmd_tx, signaling) = create_test_relay(ServerConfig::default());
    let (a, _) = connect_peer(&cmd_tx, LOCALHOST).await;
    let (b, _) = connect_peer(&cmd_tx, LOCALHOST).await;
    let (c, _) = connect_peer(&cmd_tx, LOCALHOST).await;

    for peer in [a, b, c] {
        send_signal(&cmd_tx, peer, ClientSignal::JoinRoom { room_id: RoomId::from("r") }).await;
    }

    cmd_tx
        .send(RelayCommand::Disconnect { peer_id: b })
        .await
        .unwrap();

    for remaining in [a, c] {
        let left = signaling
            .wait_for(&remaining, 1000, |m| matches!(m, ServerSignal::PeerLeft { .. }))
            .await;
        assert_eq!(left, Some(ServerSignal::PeerLeft { peer_id: b }));
    }

    // Signals to the departed peer are no longer routed.
    send_signal(&cmd_tx, a, ClientSignal::Offer { to: b, sdp: "v=0".into() }).await;
    send_signal(&cmd_tx, a, ClientSignal::Offer { to: c, sdp: "v=0".into() }).await;
    signaling
        .wait_for(&c, 1000, |m| matches!(m, ServerSignal::Offer { .. }))
        .await
        .expect("Offer to C not delivered");
    assert!(
        !signaling
            .signals_for(&b)
            .await
            .iter()
            .any(|m| matches!(m, ServerSignal::Offer { .. }))
    );
}

#[tokio::test]
async fn test_switching_rooms_notifies_old_room() {
    init_tracing();

    let (cmd_tx, signaling) = create_test_relay(ServerConfig::default());
    let (a, _) = connect_peer(&cmd_tx, LOCALHOST).await;
    let (b, _) = connect_peer(&cmd_tx, LOCALHOST).await;

    send_signal(&cmd_tx, a, ClientSignal::JoinRoom { room_id: RoomId::from("old") }).await;
    send_signal(&cmd_tx, b, ClientSignal::JoinRoom { room_id: RoomId::from("old") }).await;
    send_signal(&cmd_tx, b, ClientSignal::JoinRoom { room_id: RoomId::from("new") }).await;

    let left = signaling
        .wait_for(&a, 1000, |m| matches!(m, ServerSignal::PeerLeft { .. }))
        .await;
    assert_eq!(left, Some(ServerSignal::PeerLeft { peer_id: b }));
}
