use ferry_client::{Client, ClientConfig, ClientEvent};
use ferry_core::{ClientSignal, RoomId, ServerSignal};

use crate::integration::{init_tracing, spawn_server};
use crate::utils::{EVENT_TIMEOUT_MS, RawPeer, wait_for_event};

/// A client that already initiated towards a newcomer ignores a crossing
/// offer from it instead of starting a second handshake.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_offer_from_handshaking_peer_is_ignored() {
    init_tracing();

    let addr = spawn_server().await;
    let config = ClientConfig {
        signaling_url: format!("ws://{}/ws", addr),
        ..ClientConfig::default()
    };

    let (client, mut events) = Client::connect(config).await.unwrap();
    let local_id = match wait_for_event(&mut events, EVENT_TIMEOUT_MS, |e| {
        matches!(e, ClientEvent::Connected { .. })
    })
    .await
    {
        Some(ClientEvent::Connected { peer_id }) => peer_id,
        other => panic!("Expected Connected, got {:?}", other),
    };

    let room_id = RoomId::from("dup-room");
    client.join_room(room_id.clone()).await.unwrap();
    wait_for_event(&mut events, EVENT_TIMEOUT_MS, |e| {
        matches!(e, ClientEvent::RoomJoined { .. })
    })
    .await
    .expect("Client never joined");

    let mut remote = RawPeer::connect(addr).await;
    remote.send(&ClientSignal::JoinRoom { room_id }).await;

    // The client sees PeerJoined and offers exactly once.
    let mut offers = 0;
    for signal in remote.drain(1000).await {
        if matches!(signal, ServerSignal::Offer { from, .. } if from == local_id) {
            offers += 1;
        }
    }
    assert_eq!(offers, 1);

    // Answering with a crossing offer must not restart or tear down the session.
    remote
        .send(&ClientSignal::Offer {
            to: local_id,
            sdp: "v=0 crossing offer".into(),
        })
        .await;

    let replies = remote.drain(1000).await;
    assert!(
        !replies
            .iter()
            .any(|s| matches!(s, ServerSignal::Answer { .. } | ServerSignal::Offer { .. })),
        "Unexpected handshake traffic: {:?}",
        replies
    );
    assert!(
        wait_for_event(&mut events, 1000, |e| {
            matches!(e, ClientEvent::PeerDisconnected(_))
        })
        .await
        .is_none(),
        "Live session was torn down"
    );

    client.shutdown().await.unwrap();
}
