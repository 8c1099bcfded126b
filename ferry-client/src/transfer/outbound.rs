use crate::channel::DirectChannel;
use crate::config::ClientConfig;
use crate::error::{ChannelError, TransferError};
use crate::transfer::{Backpressure, FileData, Progress, StatsSampler};
use bytes::Bytes;
use ferry_core::utils::total_chunks;
use ferry_core::{ControlFrame, Frame, PeerId, TransferDirection, TransferRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// One destination of an outbound transfer.
#[derive(Clone)]
pub struct Recipient {
    pub peer_id: PeerId,
    pub channel: Arc<dyn DirectChannel>,
}

impl Recipient {
    pub fn new(peer_id: PeerId, channel: Arc<dyn DirectChannel>) -> Self {
        Self { peer_id, channel }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    Progress(Progress),
    RecipientDropped { peer_id: PeerId, reason: ChannelError },
}

#[derive(Debug, Clone)]
pub struct OutboundReport {
    pub record: TransferRecord,
    pub delivered: Vec<PeerId>,
    pub dropped: Vec<PeerId>,
}

/// Sends one file to a fixed set of recipients: a metadata frame, then every
/// chunk in order, each chunk to every recipient before the next one.
pub struct OutboundTransfer {
    file: FileData,
    chunk_size: usize,
    total_chunks: u64,
    stats_interval: u64,
    retry_delay: Duration,
    max_retries: u32,
    backpressure: Backpressure,
}

impl OutboundTransfer {
    pub fn new(file: FileData, config: &ClientConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        Self {
            total_chunks: total_chunks(file.size(), chunk_size),
            file,
            chunk_size,
            stats_interval: config.stats_interval_chunks,
            retry_delay: config.send_retry_delay,
            max_retries: config.max_send_retries,
            backpressure: Backpressure::from_config(config),
        }
    }

    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    pub fn metadata(&self) -> ControlFrame {
        ControlFrame::Metadata {
            name: self.file.name.clone(),
            size: self.file.size(),
            total_chunks: self.total_chunks,
        }
    }

    /// Zero-copy slice of chunk `index`. The last chunk may be short.
    pub fn chunk(&self, index: u64) -> Bytes {
        let start = (index as usize).saturating_mul(self.chunk_size);
        let start = start.min(self.file.data.len());
        let end = start.saturating_add(self.chunk_size).min(self.file.data.len());
        self.file.data.slice(start..end)
    }

    pub fn chunks(&self) -> impl Iterator<Item = Bytes> + '_ {
        (0..self.total_chunks).map(|index| self.chunk(index))
    }

    pub async fn run(
        self,
        recipients: Vec<Recipient>,
        mut pause: watch::Receiver<bool>,
        events: mpsc::UnboundedSender<OutboundEvent>,
    ) -> Result<OutboundReport, TransferError> {
        let sampler = StatsSampler::new(self.file.size(), self.stats_interval);
        let mut active = recipients;
        let mut dropped = Vec::new();

        if active.is_empty() {
            return Err(TransferError::NoRecipients);
        }

        info!(
            "Sending '{}' ({} bytes, {} chunks) to {} peer(s)",
            self.file.name,
            self.file.size(),
            self.total_chunks,
            active.len()
        );

        let metadata = self
            .metadata()
            .to_frame()
            .map_err(|e| TransferError::Aborted(e.to_string()))?;
        self.fan_out(&metadata, &mut active, &mut dropped, &events)
            .await?;

        let mut bytes_sent = 0u64;
        for index in 0..self.total_chunks {
            wait_unpaused(&mut pause).await?;

            let chunk = self.chunk(index);
            bytes_sent += chunk.len() as u64;
            self.fan_out(&Frame::Binary(chunk), &mut active, &mut dropped, &events)
                .await?;

            let done = index + 1;
            if sampler.is_due(done, self.total_chunks) {
                let _ = events.send(OutboundEvent::Progress(sampler.sample(bytes_sent)));
                tokio::task::yield_now().await;
            }
        }

        let record = TransferRecord::new(
            TransferDirection::Sent,
            self.file.name.clone(),
            self.file.size(),
            sampler.started_at().elapsed(),
        );
        info!(
            "Sent '{}' to {} peer(s) in {:?}",
            record.name,
            active.len(),
            record.duration
        );

        Ok(OutboundReport {
            record,
            delivered: active.into_iter().map(|r| r.peer_id).collect(),
            dropped,
        })
    }

    async fn fan_out(
        &self,
        frame: &Frame,
        active: &mut Vec<Recipient>,
        dropped: &mut Vec<PeerId>,
        events: &mpsc::UnboundedSender<OutboundEvent>,
    ) -> Result<(), TransferError> {
        let mut i = 0;
        while i < active.len() {
            match self.deliver(&active[i], frame).await {
                Ok(()) => i += 1,
                Err(reason) => {
                    let recipient = active.remove(i);
                    warn!(
                        "Dropping {} from transfer of '{}': {}",
                        recipient.peer_id, self.file.name, reason
                    );
                    let _ = events.send(OutboundEvent::RecipientDropped {
                        peer_id: recipient.peer_id,
                        reason,
                    });
                    dropped.push(recipient.peer_id);
                }
            }
        }

        if active.is_empty() {
            return Err(TransferError::NoRecipients);
        }
        Ok(())
    }

    async fn deliver(&self, recipient: &Recipient, frame: &Frame) -> Result<(), ChannelError> {
        let channel = recipient.channel.as_ref();
        let mut failures = 0u32;

        loop {
            self.backpressure.ready(channel).await?;

            match channel.send(frame).await {
                Ok(()) => return Ok(()),
                Err(ChannelError::Closed) => return Err(ChannelError::Closed),
                Err(e) => {
                    failures += 1;
                    if failures >= self.max_retries {
                        error!(
                            "Giving up on {} after {} failed sends: {}",
                            recipient.peer_id, failures, e
                        );
                        return Err(e);
                    }
                    debug!("Send to {} failed, retrying: {}", recipient.peer_id, e);
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}

async fn wait_unpaused(pause: &mut watch::Receiver<bool>) -> Result<(), TransferError> {
    if !*pause.borrow() {
        return Ok(());
    }

    info!("Transfer paused");
    pause
        .wait_for(|paused| !*paused)
        .await
        .map_err(|_| TransferError::Aborted("client shut down while paused".to_owned()))?;
    info!("Transfer resumed");
    Ok(())
}
