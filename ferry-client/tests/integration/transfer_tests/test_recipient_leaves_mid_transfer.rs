use ferry_client::transfer::{OutboundEvent, OutboundTransfer};
use ferry_client::{ChannelError, FileData};
use tokio::sync::{mpsc, watch};

use crate::integration::{init_tracing, memory_recipient, test_config};
use crate::utils::{payload, spawn_receiver};

#[tokio::test]
async fn test_remaining_peer_still_gets_the_file() {
    init_tracing();

    let data = payload(10 * 1024 * 1024);
    let transfer = OutboundTransfer::new(FileData::new("big.iso", data.clone()), &test_config());

    let (to_b, _, b_receiver) = memory_recipient();
    let (to_c, _, c_receiver) = memory_recipient();
    let (b, c) = (to_b.peer_id, to_c.peer_id);
    let b_receiving = spawn_receiver(b_receiver, Some(3));
    let c_receiving = spawn_receiver(c_receiver, None);

    let (_pause_tx, pause_rx) = watch::channel(false);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let report = transfer
        .run(vec![to_b, to_c], pause_rx, events_tx)
        .await
        .expect("Transfer should survive one peer leaving");

    assert_eq!(report.delivered, vec![c]);
    assert_eq!(report.dropped, vec![b]);

    let b_outcome = b_receiving.await.unwrap();
    assert!(b_outcome.file.is_none());
    assert_eq!(b_outcome.chunks, 3);

    let c_file = c_receiving.await.unwrap().file.expect("C got nothing");
    assert!(c_file.data == data);

    let mut dropped = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        if let OutboundEvent::RecipientDropped { peer_id, reason } = event {
            dropped.push((peer_id, reason));
        }
    }
    assert_eq!(dropped, vec![(b, ChannelError::Closed)]);
}

#[tokio::test]
async fn test_last_peer_leaving_fails_transfer() {
    init_tracing();

    let transfer = OutboundTransfer::new(
        FileData::new("big.iso", payload(10 * 1024 * 1024)),
        &test_config(),
    );
    let (to_b, _, b_receiver) = memory_recipient();
    let _b_receiving = spawn_receiver(b_receiver, Some(2));

    let (_pause_tx, pause_rx) = watch::channel(false);
    let (events_tx, _events_rx) = mpsc::unbounded_channel();
    let result = transfer.run(vec![to_b], pause_rx, events_tx).await;

    assert_eq!(
        result.unwrap_err(),
        ferry_client::TransferError::NoRecipients
    );
}
