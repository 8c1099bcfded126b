use ferry_client::{Client, ClientConfig, ClientEvent, FileData};
use ferry_core::{RoomId, TransferDirection};

use crate::integration::{init_tracing, spawn_server};
use crate::utils::{CONNECTION_TIMEOUT_MS, EVENT_TIMEOUT_MS, payload, wait_for_event};

/// Two clients meet through a real relay, open a WebRTC data channel over
/// loopback and move a file across it.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_moves_between_two_clients() {
    init_tracing();

    let addr = spawn_server().await;
    let config = ClientConfig {
        signaling_url: format!("ws://{}/ws", addr),
        ..ClientConfig::default()
    };

    let (alice, mut alice_events) = Client::connect(config.clone()).await.unwrap();
    let (bob, mut bob_events) = Client::connect(config).await.unwrap();

    let room_id = RoomId::from("e2e-room");
    alice.join_room(room_id.clone()).await.unwrap();
    wait_for_event(&mut alice_events, EVENT_TIMEOUT_MS, |e| {
        matches!(e, ClientEvent::RoomJoined { .. })
    })
    .await
    .expect("Alice never joined");

    bob.join_room(room_id).await.unwrap();

    // Alice initiates towards the newcomer; both sides see one open peer.
    for events in [&mut alice_events, &mut bob_events] {
        wait_for_event(events, CONNECTION_TIMEOUT_MS, |e| {
            *e == ClientEvent::PeerCountChanged(1)
        })
        .await
        .expect("Direct channel never opened");
    }

    let data = payload(700 * 1024);
    alice
        .select_file(FileData::new("notes.pdf", data.clone()))
        .await
        .unwrap();
    alice.send_file().await.unwrap();

    let received = wait_for_event(&mut bob_events, CONNECTION_TIMEOUT_MS, |e| {
        matches!(e, ClientEvent::FileReceived { .. })
    })
    .await;
    let Some(ClientEvent::FileReceived { file, .. }) = received else {
        panic!("Bob never received the file");
    };
    assert_eq!(file.name, "notes.pdf");
    assert!(file.data == data);

    let sent = wait_for_event(&mut alice_events, EVENT_TIMEOUT_MS, |e| {
        matches!(e, ClientEvent::TransferComplete(_))
    })
    .await;
    assert!(matches!(
        sent,
        Some(ClientEvent::TransferComplete(record))
            if record.direction == TransferDirection::Sent && record.name == "notes.pdf"
    ));

    let alice_history = alice.history().await.unwrap();
    let bob_history = bob.history().await.unwrap();
    assert_eq!(alice_history.sent()[0].name, "notes.pdf");
    assert_eq!(bob_history.received()[0].name, "notes.pdf");
    assert_eq!(bob_history.received()[0].size, data.len() as u64);

    // Bob leaving closes Alice's session with him.
    bob.shutdown().await.unwrap();
    wait_for_event(&mut alice_events, CONNECTION_TIMEOUT_MS, |e| {
        matches!(e, ClientEvent::PeerDisconnected(_))
    })
    .await
    .expect("Alice never saw Bob leave");

    alice.shutdown().await.unwrap();
}
