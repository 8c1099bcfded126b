use std::time::Duration;

use ferry_client::FileData;
use ferry_client::transfer::OutboundTransfer;
use tokio::sync::{mpsc, watch};

use crate::integration::{init_tracing, memory_recipient, test_config};
use crate::utils::{payload, spawn_receiver};

#[tokio::test]
async fn test_paused_transfer_stalls_until_resumed() {
    init_tracing();

    let data = payload(1024 * 1024);
    let transfer = OutboundTransfer::new(FileData::new("f", data.clone()), &test_config());
    let (recipient, channel, receiver) = memory_recipient();
    let receiving = spawn_receiver(receiver, None);

    let (pause_tx, pause_rx) = watch::channel(true);
    let (events_tx, _events_rx) = mpsc::unbounded_channel();
    let sending = tokio::spawn(transfer.run(vec![recipient], pause_rx, events_tx));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(channel.frames_sent(), 1, "only metadata goes out while paused");
    assert!(!sending.is_finished());

    pause_tx.send_replace(false);
    let report = tokio::time::timeout(Duration::from_secs(5), sending)
        .await
        .expect("Transfer never resumed")
        .unwrap()
        .unwrap();

    assert_eq!(report.record.size, data.len() as u64);
    assert!(receiving.await.unwrap().file.unwrap().data == data);
}

#[tokio::test]
async fn test_dropping_pause_sender_aborts_paused_transfer() {
    init_tracing();

    let transfer = OutboundTransfer::new(FileData::new("f", payload(1024)), &test_config());
    let (recipient, _channel, _receiver) = memory_recipient();

    let (pause_tx, pause_rx) = watch::channel(true);
    let (events_tx, _events_rx) = mpsc::unbounded_channel();
    let sending = tokio::spawn(transfer.run(vec![recipient], pause_rx, events_tx));

    tokio::time::sleep(Duration::from_millis(20)).await;
    drop(pause_tx);

    let result = tokio::time::timeout(Duration::from_secs(1), sending)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(
        result,
        Err(ferry_client::TransferError::Aborted(_))
    ));
}
