use crate::channel::DirectChannel;
use crate::error::SessionError;
use crate::session::{RtcPeer, SessionKey, SessionRole, SessionState};
use crate::transfer::{InboundEvent, Reassembler};
use ferry_core::{Frame, PeerId};
use std::sync::Arc;
use tracing::{debug, warn};

/// State kept for one remote participant: handshake progress, the WebRTC
/// connection, the open channel and the inbound reassembly buffer.
pub struct PeerSession {
    key: SessionKey,
    role: SessionRole,
    state: SessionState,
    rtc: Option<Arc<RtcPeer>>,
    channel: Option<Arc<dyn DirectChannel>>,
    reassembler: Reassembler,
}

impl PeerSession {
    pub fn new(key: SessionKey, role: SessionRole, stats_interval: u64) -> Self {
        Self {
            key,
            role,
            state: SessionState::Idle,
            rtc: None,
            channel: None,
            reassembler: Reassembler::new(stats_interval),
        }
    }

    pub fn remote(&self) -> PeerId {
        self.key.remote
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.state.is_live()
    }

    pub fn rtc(&self) -> Option<&Arc<RtcPeer>> {
        self.rtc.as_ref()
    }

    pub fn channel(&self) -> Option<&Arc<dyn DirectChannel>> {
        self.channel.as_ref()
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    pub fn begin_handshake(&mut self, rtc: Option<Arc<RtcPeer>>) -> Result<(), SessionError> {
        self.state.transition(SessionState::Handshaking)?;
        self.rtc = rtc;
        Ok(())
    }

    pub fn open(&mut self, channel: Arc<dyn DirectChannel>) -> Result<(), SessionError> {
        self.state.transition(SessionState::Open)?;
        self.channel = Some(channel);
        Ok(())
    }

    pub fn on_frame(&mut self, frame: Frame) -> Vec<InboundEvent> {
        if self.state != SessionState::Open {
            warn!(
                "Dropping {} byte frame from {} in state {:?}",
                frame.len(),
                self.key,
                self.state
            );
            return Vec::new();
        }
        self.reassembler.accept(frame)
    }

    /// Moves to `Closed`, discarding any unfinished inbound transfer.
    /// Returns the state the session was in.
    pub async fn close(&mut self) -> SessionState {
        let prior = self.state;
        if prior == SessionState::Closed {
            return prior;
        }
        self.state = SessionState::Closed;
        self.reassembler.abort();

        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
        if let Some(rtc) = self.rtc.take() {
            if let Err(e) = rtc.close().await {
                debug!("Closing connection to {}: {}", self.key, e);
            }
        }
        prior
    }
}
