use crate::error::TransferError;
use crate::transfer::{FileData, Progress, StatsSampler};
use bytes::{Bytes, BytesMut};
use ferry_core::{ControlFrame, Frame, TransferDirection, TransferRecord};
use tracing::{debug, info, warn};

/// A file being received from one peer.
#[derive(Debug)]
pub struct InboundTransfer {
    name: String,
    size: u64,
    total_chunks: u64,
    chunks: Vec<Bytes>,
    received_bytes: u64,
    sampler: StatsSampler,
}

impl InboundTransfer {
    fn new(name: String, size: u64, total_chunks: u64, stats_interval: u64) -> Self {
        Self {
            sampler: StatsSampler::new(size, stats_interval),
            chunks: Vec::with_capacity(total_chunks.min(4096) as usize),
            received_bytes: 0,
            name,
            size,
            total_chunks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn total_chunks(&self) -> u64 {
        self.total_chunks
    }

    pub fn received_chunks(&self) -> u64 {
        self.chunks.len() as u64
    }

    fn is_complete(&self) -> bool {
        self.received_chunks() >= self.total_chunks
    }

    fn finish(self) -> InboundEvent {
        let mut data = BytesMut::with_capacity(self.received_bytes as usize);
        for chunk in &self.chunks {
            data.extend_from_slice(chunk);
        }

        let actual = data.len() as u64;
        if actual != self.size {
            return InboundEvent::Failed(TransferError::SizeMismatch {
                declared: self.size,
                actual,
            });
        }

        let record = TransferRecord::new(
            TransferDirection::Received,
            self.name.clone(),
            self.size,
            self.sampler.started_at().elapsed(),
        );
        InboundEvent::Completed {
            file: FileData::new(self.name, data.freeze()),
            record,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Started {
        name: String,
        size: u64,
        total_chunks: u64,
    },
    Progress(Progress),
    Completed {
        file: FileData,
        record: TransferRecord,
    },
    Failed(TransferError),
}

/// Per-session receive state. At most one transfer is active; new metadata
/// discards whatever was in flight and starts over.
#[derive(Debug)]
pub struct Reassembler {
    active: Option<InboundTransfer>,
    discarded: u64,
    stats_interval: u64,
}

impl Reassembler {
    pub fn new(stats_interval: u64) -> Self {
        Self {
            active: None,
            discarded: 0,
            stats_interval,
        }
    }

    pub fn active(&self) -> Option<&InboundTransfer> {
        self.active.as_ref()
    }

    /// Transfers thrown away before completion.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn accept(&mut self, frame: Frame) -> Vec<InboundEvent> {
        match frame {
            Frame::Text(text) => match ControlFrame::parse(&text) {
                Ok(ControlFrame::Metadata {
                    name,
                    size,
                    total_chunks,
                }) => self.start(name, size, total_chunks),
                Err(e) => {
                    warn!("Dropping unrecognised control frame: {}", e);
                    Vec::new()
                }
            },
            Frame::Binary(chunk) => self.append(chunk),
        }
    }

    /// Drops the in-flight transfer, if any, without producing a file.
    pub fn abort(&mut self) -> Option<InboundTransfer> {
        let transfer = self.active.take()?;
        self.discarded += 1;
        info!(
            "Discarded incomplete transfer '{}' ({}/{} chunks)",
            transfer.name,
            transfer.received_chunks(),
            transfer.total_chunks
        );
        Some(transfer)
    }

    fn start(&mut self, name: String, size: u64, total_chunks: u64) -> Vec<InboundEvent> {
        if let Some(prior) = self.active.take() {
            self.discarded += 1;
            warn!(
                "Metadata for '{}' replaces unfinished '{}' ({}/{} chunks)",
                name,
                prior.name,
                prior.received_chunks(),
                prior.total_chunks
            );
        }

        info!(
            "Receiving '{}' ({} bytes, {} chunks)",
            name, size, total_chunks
        );
        let mut events = vec![InboundEvent::Started {
            name: name.clone(),
            size,
            total_chunks,
        }];

        let transfer = InboundTransfer::new(name, size, total_chunks, self.stats_interval);
        if transfer.is_complete() {
            events.push(transfer.finish());
        } else {
            self.active = Some(transfer);
        }
        events
    }

    fn append(&mut self, chunk: Bytes) -> Vec<InboundEvent> {
        let Some(transfer) = self.active.as_mut() else {
            debug!("Dropping {} byte chunk with no active transfer", chunk.len());
            return Vec::new();
        };

        transfer.received_bytes += chunk.len() as u64;
        if transfer.received_bytes > transfer.size {
            let declared = transfer.size;
            let actual = transfer.received_bytes;
            self.active = None;
            warn!(
                "Dropping transfer after {} bytes, more than the declared {}",
                actual, declared
            );
            return vec![InboundEvent::Failed(TransferError::SizeMismatch {
                declared,
                actual,
            })];
        }
        transfer.chunks.push(chunk);

        let mut events = Vec::new();
        let done = transfer.received_chunks();
        if transfer.sampler.is_due(done, transfer.total_chunks) {
            events.push(InboundEvent::Progress(
                transfer.sampler.sample(transfer.received_bytes),
            ));
        }

        if transfer.is_complete() {
            if let Some(transfer) = self.active.take() {
                events.push(transfer.finish());
            }
        }
        events
    }
}
