use crate::client::{ClientCommand, ClientEvent, ClientHandle};
use crate::config::ClientConfig;
use crate::error::{SessionError, TransferError};
use crate::session::{
    PeerEvent, PeerSession, RtcPeer, SessionKey, SessionRole, SessionState, SessionTable,
};
use crate::signaling::SignalingClient;
use crate::transfer::{
    FileData, InboundEvent, OutboundEvent, OutboundReport, OutboundTransfer, Recipient,
};
use anyhow::Result;
use ferry_core::{
    ClientSignal, IceServerConfig, PeerId, RoomId, ServerSignal, TransferDirection,
    TransferHistory,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type OutboundResult = Result<OutboundReport, TransferError>;

/// The client event loop. Owns every peer session and processes UI commands,
/// relay signals, WebRTC events and outbound progress one at a time.
pub struct Client {
    config: ClientConfig,
    local_id: Option<PeerId>,
    room: Option<RoomId>,
    ice_servers: Vec<IceServerConfig>,
    sessions: SessionTable,
    selected: Option<FileData>,
    history: TransferHistory,

    signaling: SignalingClient,
    server_rx: mpsc::UnboundedReceiver<ServerSignal>,
    signaling_open: bool,
    command_rx: mpsc::Receiver<ClientCommand>,
    event_tx: mpsc::UnboundedSender<ClientEvent>,
    peer_tx: mpsc::Sender<PeerEvent>,
    peer_rx: mpsc::Receiver<PeerEvent>,

    pause_tx: watch::Sender<bool>,
    outbound: Option<JoinHandle<()>>,
    outbound_tx: mpsc::UnboundedSender<OutboundEvent>,
    outbound_rx: mpsc::UnboundedReceiver<OutboundEvent>,
    done_tx: mpsc::UnboundedSender<OutboundResult>,
    done_rx: mpsc::UnboundedReceiver<OutboundResult>,
}

impl Client {
    /// Connects to the relay and starts the event loop.
    pub async fn connect(
        config: ClientConfig,
    ) -> Result<(ClientHandle, mpsc::UnboundedReceiver<ClientEvent>)> {
        config.validate()?;

        let (signaling, server_rx) =
            SignalingClient::connect(&config.signaling_url, config.keepalive_interval).await?;
        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let client = Self::new(config, signaling, server_rx, command_rx, event_tx);
        tokio::spawn(client.run());

        Ok((ClientHandle::new(command_tx), event_rx))
    }

    fn new(
        config: ClientConfig,
        signaling: SignalingClient,
        server_rx: mpsc::UnboundedReceiver<ServerSignal>,
        command_rx: mpsc::Receiver<ClientCommand>,
        event_tx: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        let (peer_tx, peer_rx) = mpsc::channel(256);
        let (pause_tx, _) = watch::channel(false);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        Self {
            ice_servers: config.ice_servers.clone(),
            config,
            local_id: None,
            room: None,
            sessions: SessionTable::new(),
            selected: None,
            history: TransferHistory::default(),
            signaling,
            server_rx,
            signaling_open: true,
            command_rx,
            event_tx,
            peer_tx,
            peer_rx,
            pause_tx,
            outbound: None,
            outbound_tx,
            outbound_rx,
            done_tx,
            done_rx,
        }
    }

    pub async fn run(mut self) {
        info!("Client event loop started");

        loop {
            tokio::select! {
                biased;

                cmd = self.command_rx.recv() => match cmd {
                    Some(ClientCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },

                Some(event) = self.outbound_rx.recv() => self.handle_outbound_event(event),

                Some(result) = self.done_rx.recv() => self.finish_outbound(result),

                Some(event) = self.peer_rx.recv() => self.handle_peer_event(event).await,

                signal = self.server_rx.recv(), if self.signaling_open => match signal {
                    Some(signal) => self.handle_server_signal(signal).await,
                    None => {
                        warn!("Signaling connection closed");
                        self.signaling_open = false;
                        self.emit(ClientEvent::ServerError(
                            "signaling connection closed".to_owned(),
                        ));
                    }
                },
            }
        }

        self.shutdown().await;
        info!("Client event loop finished");
    }

    fn emit(&self, event: ClientEvent) {
        let _ = self.event_tx.send(event);
    }

    fn signal(&self, signal: ClientSignal) {
        if let Err(e) = self.signaling.send(&signal) {
            error!("Failed to send signal: {:#}", e);
        }
    }

    fn open_peers(&self) -> usize {
        self.sessions.open_count()
    }

    fn handle_command(&mut self, cmd: ClientCommand) {
        match cmd {
            ClientCommand::CreateRoom => {
                let room_id = RoomId::generate();
                info!("Creating room {}", room_id);
                self.signal(ClientSignal::JoinRoom { room_id });
            }
            ClientCommand::JoinRoom(room_id) => {
                self.signal(ClientSignal::JoinRoom { room_id });
            }
            ClientCommand::SelectFile(file) => {
                info!("Selected '{}' ({} bytes)", file.name, file.size());
                self.selected = Some(file);
            }
            ClientCommand::SendFile => {
                if let Err(e) = self.start_outbound() {
                    warn!("Cannot start transfer: {}", e);
                    self.emit(ClientEvent::TransferFailed {
                        reason: e.to_string(),
                    });
                }
            }
            ClientCommand::Pause => {
                self.pause_tx.send_replace(true);
            }
            ClientCommand::Resume => {
                self.pause_tx.send_replace(false);
            }
            ClientCommand::History(reply) => {
                let _ = reply.send(self.history.clone());
            }
            // Handled by the loop.
            ClientCommand::Shutdown => {}
        }
    }

    async fn handle_server_signal(&mut self, signal: ServerSignal) {
        match signal {
            ServerSignal::Welcome { peer_id } => {
                info!("Connected as {}", peer_id);
                self.local_id = Some(peer_id);
                self.emit(ClientEvent::Connected { peer_id });
            }
            ServerSignal::IceConfig { ice_servers } => {
                if self.config.ice_servers.is_empty() {
                    self.ice_servers = ice_servers;
                }
            }
            ServerSignal::RoomJoined {
                room_id,
                peer_count,
            } => {
                if self.room.as_ref().is_some_and(|current| current != &room_id) {
                    self.close_all_sessions().await;
                }
                info!("Joined room '{}' with {} participant(s)", room_id, peer_count);
                self.room = Some(room_id.clone());
                self.emit(ClientEvent::RoomJoined { room_id });
            }
            ServerSignal::PeerJoined { peer_id } => {
                self.start_session(peer_id, None).await;
            }
            ServerSignal::Offer { from, sdp } => {
                self.start_session(from, Some(sdp)).await;
            }
            ServerSignal::Answer { from, sdp } => {
                let Some(rtc) = self.rtc_of(&from) else {
                    warn!("Answer from {} without a session", from);
                    return;
                };
                if let Err(e) = rtc.set_remote_answer(sdp).await {
                    self.fail_handshake(from, e).await;
                }
            }
            ServerSignal::IceCandidate { from, candidate } => {
                let Some(rtc) = self.rtc_of(&from) else {
                    debug!("Candidate from {} without a session", from);
                    return;
                };
                if let Err(e) = rtc.add_ice_candidate(candidate).await {
                    warn!("Ignoring candidate from {}: {:#}", from, e);
                }
            }
            ServerSignal::PeerLeft { peer_id } => {
                info!("Peer {} left the room", peer_id);
                self.close_session(peer_id).await;
            }
            ServerSignal::Error { message } => {
                warn!("Server error: {}", message);
                self.emit(ClientEvent::ServerError(message));
            }
        }
    }

    fn rtc_of(&self, peer_id: &PeerId) -> Option<Arc<RtcPeer>> {
        self.sessions
            .get(peer_id)
            .filter(|s| s.is_live())
            .and_then(|s| s.rtc().cloned())
    }

    /// Without `offer` this side initiates; with it, this side answers.
    async fn start_session(&mut self, remote: PeerId, offer: Option<String>) {
        if Some(remote) == self.local_id {
            return;
        }
        if !self.sessions.can_start(&remote) {
            debug!("Session with {} already exists", remote);
            return;
        }

        let role = if offer.is_some() {
            SessionRole::Responder
        } else {
            SessionRole::Initiator
        };
        let key = self.sessions.next_key(remote);
        let mut session = PeerSession::new(key, role, self.config.stats_interval_chunks);

        let (rtc, reply) = match self.negotiate(key, offer).await {
            Ok(negotiated) => negotiated,
            Err(e) => {
                self.fail_handshake(remote, e).await;
                return;
            }
        };

        if let Err(e) = session.begin_handshake(Some(rtc)) {
            warn!("Session with {}: {}", remote, e);
            return;
        }
        debug!("Handshaking with {} as {:?}", key, role);
        self.sessions.insert(session);
        self.signal(reply);
    }

    async fn negotiate(
        &self,
        key: SessionKey,
        offer: Option<String>,
    ) -> Result<(Arc<RtcPeer>, ClientSignal)> {
        let remote = key.remote;
        let rtc = Arc::new(
            RtcPeer::new(
                key,
                &self.ice_servers,
                self.config.low_water_mark,
                self.peer_tx.clone(),
            )
            .await?,
        );

        let reply = match offer {
            None => rtc.create_offer().await.map(|sdp| ClientSignal::Offer { to: remote, sdp }),
            Some(offer) => rtc
                .accept_offer(offer)
                .await
                .map(|sdp| ClientSignal::Answer { to: remote, sdp }),
        };

        match reply {
            Ok(reply) => Ok((rtc, reply)),
            Err(e) => {
                let _ = rtc.close().await;
                Err(e)
            }
        }
    }

    async fn fail_handshake(&mut self, remote: PeerId, e: anyhow::Error) {
        let e = SessionError::HandshakeFailed(format!("{:#}", e));
        error!("Session with {}: {}", remote, e);
        if let Some(mut session) = self.sessions.remove(&remote) {
            session.close().await;
        }
        self.emit(ClientEvent::PeerDisconnected(remote));
    }

    async fn handle_peer_event(&mut self, event: PeerEvent) {
        let key = event.key();
        if self.sessions.current_mut(&key).is_none() {
            debug!("Ignoring event from superseded connection {}", key);
            if let PeerEvent::ChannelOpen(_, channel) = event {
                channel.close().await;
            }
            return;
        }

        match event {
            PeerEvent::CandidateGenerated(key, candidate) => {
                self.signal(ClientSignal::IceCandidate {
                    to: key.remote,
                    candidate,
                });
            }
            PeerEvent::ChannelOpen(key, channel) => {
                let Some(session) = self.sessions.current_mut(&key) else {
                    return;
                };
                if let Err(e) = session.open(channel.clone()) {
                    warn!("Channel to {} opened out of order: {}", key, e);
                    channel.close().await;
                    return;
                }
                info!("Direct channel to {} is open", key.remote);
                self.emit(ClientEvent::PeerCountChanged(self.open_peers()));
            }
            PeerEvent::Frame(key, frame) => {
                let Some(session) = self.sessions.current_mut(&key) else {
                    return;
                };
                let events = session.on_frame(frame);
                for event in events {
                    self.handle_inbound_event(key.remote, event);
                }
            }
            PeerEvent::Disconnected(key) => {
                if let Some(session) = self.sessions.remove_current(&key) {
                    self.finish_session(session).await;
                }
            }
        }
    }

    fn handle_inbound_event(&mut self, from: PeerId, event: InboundEvent) {
        match event {
            InboundEvent::Started { name, size, .. } => {
                self.emit(ClientEvent::TransferStarted {
                    direction: TransferDirection::Received,
                    name,
                    size,
                });
            }
            InboundEvent::Progress(p) => {
                self.emit(ClientEvent::TransferProgress {
                    direction: TransferDirection::Received,
                    fraction: p.fraction,
                    speed: p.speed,
                    eta: p.eta,
                });
            }
            InboundEvent::Completed { file, record } => {
                info!("Received '{}' ({} bytes) from {}", file.name, record.size, from);
                self.history.push(record.clone());
                self.emit(ClientEvent::FileReceived { from, file });
                self.emit(ClientEvent::TransferComplete(record));
            }
            InboundEvent::Failed(e) => {
                warn!("Transfer from {} failed: {}", from, e);
            }
        }
    }

    async fn close_session(&mut self, remote: PeerId) {
        if let Some(session) = self.sessions.remove(&remote) {
            self.finish_session(session).await;
        }
    }

    /// Closes a session already taken out of the table.
    async fn finish_session(&mut self, mut session: PeerSession) {
        let remote = session.remote();
        let prior = session.close().await;
        if prior.is_live() {
            self.emit(ClientEvent::PeerDisconnected(remote));
        }
        if prior == SessionState::Open {
            self.emit(ClientEvent::PeerCountChanged(self.open_peers()));
        }
    }

    async fn close_all_sessions(&mut self) {
        for remote in self.sessions.remotes() {
            self.close_session(remote).await;
        }
    }

    fn start_outbound(&mut self) -> Result<(), TransferError> {
        if self.outbound.is_some() {
            return Err(TransferError::AlreadyInProgress);
        }
        let file = self.selected.clone().ok_or(TransferError::NoFileSelected)?;

        let recipients: Vec<Recipient> = self
            .sessions
            .open_channels()
            .into_iter()
            .map(|(remote, channel)| Recipient::new(remote, channel))
            .collect();
        if recipients.is_empty() {
            return Err(TransferError::NoRecipients);
        }

        self.pause_tx.send_replace(false);
        self.emit(ClientEvent::TransferStarted {
            direction: TransferDirection::Sent,
            name: file.name.clone(),
            size: file.size(),
        });

        let transfer = OutboundTransfer::new(file, &self.config);
        let pause = self.pause_tx.subscribe();
        let events = self.outbound_tx.clone();
        let done = self.done_tx.clone();

        self.outbound = Some(tokio::spawn(async move {
            let result = transfer.run(recipients, pause, events).await;
            let _ = done.send(result);
        }));
        Ok(())
    }

    fn handle_outbound_event(&mut self, event: OutboundEvent) {
        match event {
            OutboundEvent::Progress(p) => {
                self.emit(ClientEvent::TransferProgress {
                    direction: TransferDirection::Sent,
                    fraction: p.fraction,
                    speed: p.speed,
                    eta: p.eta,
                });
            }
            OutboundEvent::RecipientDropped { peer_id, reason } => {
                info!("{} dropped from outbound transfer: {}", peer_id, reason);
            }
        }
    }

    fn finish_outbound(&mut self, result: OutboundResult) {
        self.outbound = None;
        match result {
            Ok(report) => {
                if !report.dropped.is_empty() {
                    info!(
                        "Transfer finished without {} peer(s)",
                        report.dropped.len()
                    );
                }
                self.history.push(report.record.clone());
                self.emit(ClientEvent::TransferComplete(report.record));
            }
            Err(e) => {
                warn!("Outbound transfer failed: {}", e);
                self.emit(ClientEvent::TransferFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn shutdown(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            outbound.abort();
        }
        self.close_all_sessions().await;
        self.signaling.close();
    }
}
