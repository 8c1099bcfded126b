use crate::channel::DirectChannel;
use crate::error::ChannelError;
use async_trait::async_trait;
use ferry_core::Frame;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Notify, mpsc};

struct Shared {
    open: AtomicBool,
    pending: AtomicUsize,
    frames_sent: AtomicUsize,
    failures: AtomicUsize,
    drained: Notify,
}

/// In-process `DirectChannel`. Frames queue in FIFO order until the paired
/// [`MemoryReceiver`] takes them, and only then stop counting as pending.
#[derive(Clone)]
pub struct MemoryChannel {
    tx: mpsc::UnboundedSender<Frame>,
    shared: Arc<Shared>,
}

/// Receiving end of a [`MemoryChannel`]. Dropping it closes the channel.
pub struct MemoryReceiver {
    rx: mpsc::UnboundedReceiver<Frame>,
    shared: Arc<Shared>,
}

impl MemoryChannel {
    pub fn new() -> (Self, MemoryReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            open: AtomicBool::new(true),
            pending: AtomicUsize::new(0),
            frames_sent: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            drained: Notify::new(),
        });

        (
            Self {
                tx,
                shared: shared.clone(),
            },
            MemoryReceiver { rx, shared },
        )
    }

    /// Frames successfully handed to the queue so far.
    pub fn frames_sent(&self) -> usize {
        self.shared.frames_sent.load(Ordering::SeqCst)
    }

    /// Makes the next `count` sends fail with `SendFailed`.
    pub fn fail_next_sends(&self, count: usize) {
        self.shared.failures.store(count, Ordering::SeqCst);
    }

    fn shut(&self) {
        shut(&self.shared);
    }
}

impl MemoryReceiver {
    pub async fn recv(&mut self) -> Option<Frame> {
        let frame = self.rx.recv().await?;
        self.shared.pending.fetch_sub(frame.len(), Ordering::SeqCst);
        self.shared.drained.notify_waiters();
        Some(frame)
    }

    pub fn pending_bytes(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        shut(&self.shared);
    }
}

impl Drop for MemoryReceiver {
    fn drop(&mut self) {
        shut(&self.shared);
    }
}

fn shut(shared: &Shared) {
    shared.open.store(false, Ordering::SeqCst);
    shared.drained.notify_waiters();
}

#[async_trait]
impl DirectChannel for MemoryChannel {
    async fn send(&self, frame: &Frame) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }

        let injected = self
            .shared
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if injected.is_ok() {
            return Err(ChannelError::SendFailed("injected failure".to_owned()));
        }

        self.shared.pending.fetch_add(frame.len(), Ordering::SeqCst);
        if self.tx.send(frame.clone()).is_err() {
            self.shared.pending.fetch_sub(frame.len(), Ordering::SeqCst);
            return Err(ChannelError::Closed);
        }
        self.shared.frames_sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn pending_bytes(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    async fn drained(&self) {
        self.shared.drained.notified().await;
    }

    async fn close(&self) {
        self.shut();
    }
}
