use crate::channel::{DirectChannel, RtcChannel};
use crate::session::{PeerEvent, SessionKey};
use anyhow::{Context, Result};
use bytes::Bytes;
use ferry_core::{Frame, IceServerConfig, PeerId};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

const DATA_CHANNEL_LABEL: &str = "ferry";

/// One WebRTC peer connection to a remote participant.
///
/// Everything the connection reports (local candidates, the channel opening,
/// incoming frames, disconnects) is forwarded as a [`PeerEvent`] so the client
/// loop stays the only owner of session state.
pub struct RtcPeer {
    key: SessionKey,
    peer_connection: Arc<RTCPeerConnection>,
    event_tx: mpsc::Sender<PeerEvent>,
    low_water_mark: usize,
    /// Candidates that arrived before the remote description.
    pending_candidates: Mutex<Vec<RTCIceCandidateInit>>,
}

impl RtcPeer {
    pub async fn new(
        key: SessionKey,
        ice_servers: &[IceServerConfig],
        low_water_mark: usize,
        event_tx: mpsc::Sender<PeerEvent>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state for {}: {:?}", key, s);
                    match s {
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Closed => {
                            let _ = tx.send(PeerEvent::Disconnected(key)).await;
                        }
                        _ => {}
                    }
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(json) = serde_json::to_string(&init) else {
                    return;
                };
                let _ = tx.send(PeerEvent::CandidateGenerated(key, json)).await;
            })
        }));

        // Responder side: the initiator's channel shows up here.
        let dc_tx = event_tx.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            Box::pin(async move {
                debug!("Incoming data channel '{}' from {}", dc.label(), key);
                wire_channel(key, dc, low_water_mark, tx);
            })
        }));

        Ok(Self {
            key,
            peer_connection,
            event_tx,
            low_water_mark,
            pending_candidates: Mutex::new(Vec::new()),
        })
    }

    pub fn remote(&self) -> PeerId {
        self.key.remote
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    /// Creates the ordered, reliable data channel and returns the local offer.
    pub async fn create_offer(&self) -> Result<String> {
        let init = RTCDataChannelInit {
            ordered: Some(true),
            ..Default::default()
        };
        let dc = self
            .peer_connection
            .create_data_channel(DATA_CHANNEL_LABEL, Some(init))
            .await
            .context("Failed to create data channel")?;
        wire_channel(self.key, dc, self.low_water_mark, self.event_tx.clone());

        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .context("Failed to set local description")?;

        Ok(offer.sdp)
    }

    /// Applies a remote offer and returns the local answer.
    pub async fn accept_offer(&self, sdp: String) -> Result<String> {
        let offer = RTCSessionDescription::offer(sdp)?;
        self.peer_connection
            .set_remote_description(offer)
            .await
            .context("Failed to set remote offer")?;
        self.flush_candidates().await;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .context("Failed to set local description")?;

        Ok(answer.sdp)
    }

    pub async fn set_remote_answer(&self, sdp: String) -> Result<()> {
        let answer = RTCSessionDescription::answer(sdp)?;
        self.peer_connection
            .set_remote_description(answer)
            .await
            .context("Failed to set remote answer")?;
        self.flush_candidates().await;
        Ok(())
    }

    /// Adds a trickled remote candidate, or holds it until the remote
    /// description is known.
    pub async fn add_ice_candidate(&self, candidate_json: String) -> Result<()> {
        let candidate: RTCIceCandidateInit =
            serde_json::from_str(&candidate_json).context("Failed to parse ICE candidate JSON")?;

        if self.peer_connection.remote_description().await.is_none() {
            self.pending_candidates.lock().await.push(candidate);
            return Ok(());
        }

        self.peer_connection
            .add_ice_candidate(candidate)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn flush_candidates(&self) {
        let pending = std::mem::take(&mut *self.pending_candidates.lock().await);
        for candidate in pending {
            if let Err(e) = self.peer_connection.add_ice_candidate(candidate).await {
                warn!("Dropping buffered candidate from {}: {}", self.key, e);
            }
        }
    }

    pub async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Hooks a data channel's open, message and close callbacks up to `tx`.
fn wire_channel(
    key: SessionKey,
    dc: Arc<RTCDataChannel>,
    low_water_mark: usize,
    tx: mpsc::Sender<PeerEvent>,
) {
    let dc_on_open = dc.clone();
    let tx_open = tx.clone();
    dc.on_open(Box::new(move || {
        let tx = tx_open.clone();
        let dc = dc_on_open.clone();
        Box::pin(async move {
            info!("Data channel to {} open", key);
            let channel: Arc<dyn DirectChannel> = Arc::new(RtcChannel::new(dc, low_water_mark).await);
            let _ = tx.send(PeerEvent::ChannelOpen(key, channel)).await;
        })
    }));

    let tx_msg = tx.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = tx_msg.clone();
        Box::pin(async move {
            let frame = if msg.is_string {
                match String::from_utf8(msg.data.to_vec()) {
                    Ok(text) => Frame::Text(text),
                    Err(e) => {
                        warn!("Dropping non-UTF-8 text frame from {}: {}", key, e);
                        return;
                    }
                }
            } else {
                Frame::Binary(Bytes::from(msg.data.to_vec()))
            };
            let _ = tx.send(PeerEvent::Frame(key, frame)).await;
        })
    }));

    let tx_close = tx;
    dc.on_close(Box::new(move || {
        let tx = tx_close.clone();
        Box::pin(async move {
            debug!("Data channel to {} closed", key);
            let _ = tx.send(PeerEvent::Disconnected(key)).await;
        })
    }));
}
