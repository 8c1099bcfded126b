use crate::channel::DirectChannel;
use crate::error::ChannelError;
use async_trait::async_trait;
use ferry_core::Frame;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;

/// `DirectChannel` over a WebRTC data channel.
pub struct RtcChannel {
    dc: Arc<RTCDataChannel>,
    drained: Arc<Notify>,
}

impl RtcChannel {
    /// Wraps an open data channel and arms its buffered-amount-low signal
    /// at `low_water_mark`.
    pub async fn new(dc: Arc<RTCDataChannel>, low_water_mark: usize) -> Self {
        let drained = Arc::new(Notify::new());

        dc.set_buffered_amount_low_threshold(low_water_mark).await;

        let notify = drained.clone();
        dc.on_buffered_amount_low(Box::new(move || {
            let notify = notify.clone();
            Box::pin(async move {
                notify.notify_waiters();
            })
        }))
        .await;

        Self { dc, drained }
    }

    pub fn label(&self) -> &str {
        self.dc.label()
    }
}

#[async_trait]
impl DirectChannel for RtcChannel {
    async fn send(&self, frame: &Frame) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }

        let result = match frame {
            Frame::Text(text) => self.dc.send_text(text.clone()).await,
            Frame::Binary(data) => self.dc.send(data).await,
        };

        match result {
            Ok(_) => Ok(()),
            Err(webrtc::Error::ErrClosedPipe) => Err(ChannelError::Closed),
            Err(e) if !self.is_open() => {
                debug!("Send on closing channel '{}': {}", self.label(), e);
                Err(ChannelError::Closed)
            }
            Err(e) => Err(ChannelError::SendFailed(e.to_string())),
        }
    }

    async fn pending_bytes(&self) -> usize {
        self.dc.buffered_amount().await
    }

    fn is_open(&self) -> bool {
        self.dc.ready_state() == RTCDataChannelState::Open
    }

    async fn drained(&self) {
        self.drained.notified().await;
    }

    async fn close(&self) {
        if let Err(e) = self.dc.close().await {
            debug!("Closing data channel '{}': {}", self.label(), e);
        }
    }
}
