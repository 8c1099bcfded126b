use ferry_core::{ClientSignal, RoomId, ServerSignal};
use ferry_server::ServerConfig;

use crate::integration::{init_tracing, spawn_server};
use crate::utils::WsTestClient;

#[tokio::test]
async fn test_malformed_messages_are_dropped_and_connection_survives() {
    init_tracing();

    let addr = spawn_server(ServerConfig::default()).await;
    let (mut a, _) = WsTestClient::connect_welcomed(addr).await.unwrap();

    a.send_raw("not json at all").await.unwrap();
    a.send_raw(r#"{"op":"Offer","d":{"to":"not-a-uuid","sdp":"v=0"}}"#)
        .await
        .unwrap();
    a.send_raw(r#"{"op":"Teleport","d":{}}"#).await.unwrap();

    let room_id = RoomId::from("still-alive");
    a.send(&ClientSignal::JoinRoom { room_id: room_id.clone() }).await.unwrap();
    assert_eq!(
        a.recv().await.unwrap(),
        ServerSignal::RoomJoined { room_id, peer_count: 1 }
    );
}

#[tokio::test]
async fn test_self_addressed_signal_is_dropped() {
    init_tracing();

    let addr = spawn_server(ServerConfig::default()).await;
    let (mut a, a_id) = WsTestClient::connect_welcomed(addr).await.unwrap();
    let (mut b, b_id) = WsTestClient::connect_welcomed(addr).await.unwrap();

    let room_id = RoomId::from("loop");
    a.send(&ClientSignal::JoinRoom { room_id: room_id.clone() }).await.unwrap();
    a.recv().await.unwrap();
    b.send(&ClientSignal::JoinRoom { room_id }).await.unwrap();
    b.recv().await.unwrap();
    assert_eq!(a.recv().await.unwrap(), ServerSignal::PeerJoined { peer_id: b_id });

    a.send(&ClientSignal::Offer { to: a_id, sdp: "v=0 self".into() }).await.unwrap();
    a.send(&ClientSignal::Offer { to: b_id, sdp: "v=0 real".into() }).await.unwrap();

    assert_eq!(
        b.recv().await.unwrap(),
        ServerSignal::Offer { from: a_id, sdp: "v=0 real".into() }
    );
}
