use crate::admission::AdmissionGuard;
use crate::config::ServerConfig;
use crate::relay::{Participant, RelayCommand};
use crate::room::RoomRegistry;
use crate::signaling::SignalingOutput;
use ferry_core::{
    AdmissionError, ClientSignal, IceServerConfig, PeerId, RoomId, ServerSignal, ValidationError,
};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Owns all cross-participant state: room membership, per-address counters
/// and the participant table. Commands are handled one at a time, so no
/// handler ever observes another's half-finished mutation.
pub struct Relay {
    registry: RoomRegistry,
    guard: AdmissionGuard,
    participants: HashMap<PeerId, Participant>,
    command_rx: mpsc::Receiver<RelayCommand>,
    signaling: Arc<dyn SignalingOutput>,
    ice_servers: Vec<IceServerConfig>,
}

impl Relay {
    pub fn new(
        config: &ServerConfig,
        command_rx: mpsc::Receiver<RelayCommand>,
        signaling: Arc<dyn SignalingOutput>,
    ) -> Self {
        Self {
            registry: RoomRegistry::new(config),
            guard: AdmissionGuard::new(config.max_connections_per_ip),
            participants: HashMap::new(),
            command_rx,
            signaling,
            ice_servers: config.ice_servers.clone(),
        }
    }

    pub async fn run(mut self) {
        info!("Relay event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Relay event loop finished");
    }

    async fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Connect {
                peer_id,
                addr,
                reply,
            } => {
                let result = self.admit(peer_id, addr);
                let admitted = result.is_ok();
                if reply.send(result).is_err() && admitted {
                    // The socket went away before hearing back.
                    self.disconnect(&peer_id).await;
                    return;
                }
                if admitted {
                    self.greet(peer_id).await;
                }
            }

            RelayCommand::Signal { peer_id, signal } => {
                if let Err(e) = self.handle_signal(peer_id, signal).await {
                    warn!("Dropping signal from {}: {}", peer_id, e);
                }
            }

            RelayCommand::Disconnect { peer_id } => {
                self.disconnect(&peer_id).await;
            }
        }
    }

    fn admit(&mut self, peer_id: PeerId, addr: IpAddr) -> Result<(), AdmissionError> {
        if self.participants.contains_key(&peer_id) {
            warn!("Participant id {} is already registered", peer_id);
            return Err(AdmissionError::DuplicateParticipant);
        }

        self.guard.admit(addr)?;
        self.participants
            .insert(peer_id, Participant::new(peer_id, addr));

        info!("Participant {} connected from {}", peer_id, addr);
        Ok(())
    }

    async fn greet(&self, peer_id: PeerId) {
        self.signaling
            .send_signal(peer_id, ServerSignal::Welcome { peer_id })
            .await;
        self.signaling
            .send_signal(
                peer_id,
                ServerSignal::IceConfig {
                    ice_servers: self.ice_servers.clone(),
                },
            )
            .await;
    }

    async fn handle_signal(
        &mut self,
        peer_id: PeerId,
        signal: ClientSignal,
    ) -> Result<(), ValidationError> {
        if !self.participants.contains_key(&peer_id) {
            return Err(ValidationError::Malformed("unknown sender".to_owned()));
        }
        signal.validate(&peer_id)?;

        match signal {
            ClientSignal::JoinRoom { room_id } => {
                self.join(peer_id, room_id).await;
                Ok(())
            }
            routed => self.route(peer_id, routed).await,
        }
    }

    async fn join(&mut self, peer_id: PeerId, room_id: RoomId) {
        let outcome = match self.registry.join(peer_id, room_id) {
            Ok(outcome) => outcome,
            Err(e) => {
                info!("Join refused for {}: {}", peer_id, e);
                self.signaling
                    .send_signal(
                        peer_id,
                        ServerSignal::Error {
                            message: e.to_string(),
                        },
                    )
                    .await;
                return;
            }
        };

        if let Some(left) = outcome.left {
            for member in left.remaining {
                self.signaling
                    .send_signal(member, ServerSignal::PeerLeft { peer_id })
                    .await;
            }
        }

        if !outcome.already_member {
            for member in &outcome.existing {
                self.signaling
                    .send_signal(*member, ServerSignal::PeerJoined { peer_id })
                    .await;
            }
            info!(
                "Peer {} joined room '{}'. Total users: {}",
                peer_id,
                outcome.room_id,
                outcome.existing.len() + 1
            );
        }

        self.signaling
            .send_signal(
                peer_id,
                ServerSignal::RoomJoined {
                    peer_count: outcome.existing.len() + 1,
                    room_id: outcome.room_id,
                },
            )
            .await;
    }

    async fn route(&self, from: PeerId, signal: ClientSignal) -> Result<(), ValidationError> {
        let to = signal.target().ok_or(ValidationError::UnknownRecipient)?;

        if self.registry.room_of(&from).is_none() {
            return Err(ValidationError::NotInRoom);
        }
        if !self.registry.share_room(&from, &to) {
            return Err(ValidationError::UnknownRecipient);
        }

        let Some(delivery) = signal.into_delivery(from) else {
            return Ok(());
        };
        debug!("Relaying {} from {} to {}", kind(&delivery), from, to);
        self.signaling.send_signal(to, delivery).await;
        Ok(())
    }

    async fn disconnect(&mut self, peer_id: &PeerId) {
        let Some(participant) = self.participants.remove(peer_id) else {
            return;
        };
        self.guard.release(participant.addr);

        if let Some(left) = self.registry.leave(peer_id) {
            for member in left.remaining {
                self.signaling
                    .send_signal(member, ServerSignal::PeerLeft { peer_id: *peer_id })
                    .await;
            }
        }

        info!(
            "Participant {} disconnected after {:?}",
            peer_id,
            participant.joined_at.elapsed()
        );
    }
}

fn kind(signal: &ServerSignal) -> &'static str {
    match signal {
        ServerSignal::Offer { .. } => "offer",
        ServerSignal::Answer { .. } => "answer",
        ServerSignal::IceCandidate { .. } => "ice-candidate",
        _ => "signal",
    }
}
