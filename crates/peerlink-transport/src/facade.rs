//! Transport facade
//!
//! `PeerTransport` implements the abstract transport contract over a
//! relay session service, falling back to a wrapped direct transport
//! for every address that does not carry the `peer:` scheme. It owns
//! the poll loop that drains the session service once per application
//! tick and dispatches implicit-connect and receive events.
//!
//! Everything here runs single-threaded on the application tick: the
//! session service's calls are non-blocking and its resolutions arrive
//! through the polled event queue, never on another thread.

use tracing::{debug, info, warn};

use peerlink_core::{
    LobbyId, Message, PeerId, PeerlinkError, PeerlinkResult, TransportConfig,
};
use peerlink_session::{LobbyVisibility, SessionService};
use peerlink_wire::{PacketCodec, MAX_PACKET_SIZE};

use crate::{
    delivery_mode, member_limit_for, AppHandler, ConnectionInfo, DialCallback, DiscoverCallback,
    DiscoverDone, NetProvider, PingCallback, PingFailed, SessionRegistry, ShutdownGuard,
    StatusSource,
};

/// Address prefix selecting the relay transport
pub const PEER_SCHEME: &str = "peer:";

/// Client-role session lifecycle. `Disconnected` is terminal for the
/// session; a new dial starts a fresh cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    Joining { lobby: LobbyId },
    Connected { lobby: LobbyId, host: PeerId },
    Disconnected,
}

impl ClientState {
    /// The remote host id, once the join resolved
    pub fn bound_host(&self) -> Option<PeerId> {
        match self {
            ClientState::Connected { host, .. } => Some(*host),
            _ => None,
        }
    }

    /// The lobby this client is joining or joined
    pub fn lobby(&self) -> Option<LobbyId> {
        match self {
            ClientState::Joining { lobby } | ClientState::Connected { lobby, .. } => Some(*lobby),
            _ => None,
        }
    }
}

/// The relay transport facade.
///
/// Owns the current lobby, the bound host, and the pending
/// join/discovery callbacks. The wrapped direct transport is an
/// explicit constructor dependency.
pub struct PeerTransport<S: SessionService, P: NetProvider> {
    pub(crate) session: S,
    pub(crate) fallback: P,
    pub(crate) codec: PacketCodec,
    read_buf: Vec<u8>,
    pub(crate) registry: SessionRegistry,
    pub(crate) client: ClientState,
    /// Bound while hosting a lobby; clearing it is the authoritative
    /// "left lobby" signal for the server role.
    pub(crate) hosted_lobby: Option<LobbyId>,
    pub(crate) server: bool,
    /// At most one outstanding join; overwritten, not queued.
    pub(crate) pending_join: Option<DialCallback>,
    /// At most one outstanding discovery; overwritten, not queued.
    pub(crate) pending_discovery: Option<(DiscoverCallback, DiscoverDone)>,
    pub(crate) config: TransportConfig,
    guard: ShutdownGuard,
}

impl<S: SessionService, P: NetProvider> PeerTransport<S, P> {
    pub fn new(session: S, fallback: P) -> Self {
        Self::with_config(session, fallback, TransportConfig::default())
    }

    pub fn with_config(session: S, fallback: P, config: TransportConfig) -> Self {
        PeerTransport {
            session,
            fallback,
            codec: PacketCodec::new(),
            read_buf: vec![0u8; MAX_PACKET_SIZE],
            registry: SessionRegistry::new(),
            client: ClientState::Idle,
            hosted_lobby: None,
            server: false,
            pending_join: None,
            pending_discovery: None,
            config,
            guard: ShutdownGuard::new(),
        }
    }

    /// Whether this process is currently a relay client
    pub fn is_peer_client(&self) -> bool {
        self.client.bound_host().is_some()
    }

    pub fn client_state(&self) -> ClientState {
        self.client
    }

    pub fn hosted_lobby(&self) -> Option<LobbyId> {
        self.hosted_lobby
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TransportConfig {
        &mut self.config
    }

    /// Clone of the shutdown flag, for process-exit hooks
    pub fn shutdown_guard(&self) -> ShutdownGuard {
        self.guard.clone()
    }

    /// Connect to a server. A `peer:<lobby-id>` address joins the relay
    /// lobby and fires `on_success` only once the join resolves; any
    /// other address is delegated verbatim.
    pub fn dial(
        &mut self,
        address: &str,
        port: u16,
        on_success: DialCallback,
    ) -> PeerlinkResult<()> {
        match address.strip_prefix(PEER_SCHEME) {
            Some(raw) => {
                let id: u64 = raw
                    .parse()
                    .map_err(|_| PeerlinkError::InvalidAddress(address.to_string()))?;
                let lobby = LobbyId::new(id);
                if self.pending_join.is_some() {
                    warn!(%lobby, "replacing outstanding join request");
                }
                self.pending_join = Some(on_success);
                self.client = ClientState::Joining { lobby };
                info!(%lobby, "joining lobby");
                self.session.join_lobby(lobby);
                Ok(())
            }
            None => self.fallback.dial(address, port, on_success),
        }
    }

    /// Send to the connected server. Routed to the bound host while a
    /// relay client, otherwise delegated. A relay send failure here is
    /// not connection-fatal; it is routed to the application's error
    /// handler.
    pub fn send(&mut self, message: &Message, reliable: bool, handler: &mut dyn AppHandler) {
        match self.client.bound_host() {
            Some(host) => {
                if let Err(error) = self.encode_and_send(host, message, reliable) {
                    handler.handle_error(error);
                }
            }
            None => self.fallback.send(message, reliable),
        }
    }

    /// Send to one registered peer. Failure is connection-fatal for
    /// that peer: the connection is closed and deregistered, the error
    /// is logged and swallowed so other peers keep flowing.
    pub fn send_to(
        &mut self,
        peer: PeerId,
        message: &Message,
        reliable: bool,
        handler: &mut dyn AppHandler,
    ) {
        if let Err(error) = self.encode_and_send(peer, message, reliable) {
            warn!(%peer, %error, "send failed, dropping peer connection");
            self.close_peer(peer, handler);
        }
    }

    /// Send to every registered peer, iterating a snapshot so a
    /// mid-broadcast disconnect cannot derail the pass.
    pub fn broadcast(&mut self, message: &Message, reliable: bool, handler: &mut dyn AppHandler) {
        for peer in self.registry.snapshot() {
            if self.registry.contains(peer) {
                self.send_to(peer, message, reliable, handler);
            }
        }
    }

    fn encode_and_send(
        &mut self,
        peer: PeerId,
        message: &Message,
        reliable: bool,
    ) -> PeerlinkResult<()> {
        let frame = self.codec.encode(message)?;
        let mode = delivery_mode(message, frame.len(), reliable);
        self.session.send(peer, frame, mode)
    }

    /// Leave the current relay session, or delegate when not a relay
    /// client. Synthesizes exactly one disconnect per episode.
    pub fn disconnect_client(&mut self, handler: &mut dyn AppHandler) {
        if self.is_peer_client() {
            self.drop_client_session(handler);
        } else {
            self.fallback.disconnect_client();
        }
    }

    /// Open the local listener, then create the public lobby. Lobby
    /// creation resolves asynchronously; until then (or on refusal) the
    /// server runs direct-only.
    pub fn host_server(&mut self, port: u16) -> PeerlinkResult<()> {
        self.fallback.host_server(port)?;
        self.server = true;
        let limit = member_limit_for(&self.config);
        info!(port, limit, "hosting server, creating public lobby");
        self.session.create_lobby(LobbyVisibility::Public, limit);
        Ok(())
    }

    /// Close the listener, leave the lobby, and force-close every
    /// registered peer connection.
    pub fn close_server(&mut self, handler: &mut dyn AppHandler) {
        self.fallback.close_server();

        if let Some(lobby) = self.hosted_lobby.take() {
            self.session.leave_lobby(lobby);
        }
        for peer in self.registry.snapshot() {
            self.close_peer(peer, handler);
        }
        self.registry.clear();
        self.server = false;
    }

    /// Request a bounded lobby list; once it resolves the same
    /// callbacks chain into the wrapped transport's discovery, so relay
    /// results come first and direct results second, never merged.
    pub fn discover_servers(&mut self, callback: DiscoverCallback, done: DiscoverDone) {
        if self.pending_discovery.is_some() {
            warn!("replacing outstanding discovery request");
        }
        self.session.request_lobby_list(self.config.lobby_results_max);
        self.pending_discovery = Some((callback, done));
    }

    /// Pure passthrough to the wrapped transport
    pub fn ping_host(
        &mut self,
        address: &str,
        port: u16,
        on_valid: PingCallback,
        on_failed: PingFailed,
    ) {
        self.fallback.ping_host(address, port, on_valid, on_failed);
    }

    /// Relay connections merged with the wrapped transport's
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        let mut out: Vec<ConnectionInfo> = self
            .registry
            .iter()
            .map(|connection| ConnectionInfo {
                address: connection.address(),
            })
            .collect();
        out.extend(self.fallback.connections());
        out
    }

    /// Drain the session service once per application tick: first every
    /// pending event resolution, then every pending inbound datagram.
    pub fn poll(&mut self, handler: &mut dyn AppHandler, status: &dyn StatusSource) {
        while let Some(event) = self.session.next_event() {
            self.dispatch_session_event(event, handler, status);
        }

        while let Some((peer, len)) = self.session.recv(&mut self.read_buf) {
            match PacketCodec::decode(&self.read_buf[..len]) {
                Ok(message) => self.route_inbound(peer, message, handler),
                Err(error) => {
                    // Corrupt or foreign datagram; drop it, keep draining.
                    debug!(%peer, %error, "discarding undecodable datagram");
                }
            }
        }
    }

    fn route_inbound(&mut self, peer: PeerId, message: Message, handler: &mut dyn AppHandler) {
        if self.server {
            let (_, newly) = self.registry.register(peer);
            if newly {
                let address = format!("{PEER_SCHEME}{peer}");
                info!(%address, "received peer connection");
                if let Err(error) = handler.server_received(peer, Message::Connect { address }) {
                    warn!(%peer, %error, "connect handler failed");
                }
            }
            if let Err(error) = handler.server_received(peer, message) {
                warn!(%peer, %error, "server handler failed");
            }
        } else if let Some(host) = self.client.bound_host() {
            if peer == host {
                if let Err(error) = handler.client_received(message) {
                    handler.handle_error(error);
                }
            } else {
                debug!(%peer, "discarding datagram from stale session");
            }
        }
    }

    /// Close one registered peer connection: end the session, remove
    /// the registration, and (for a registered server-side client)
    /// synthesize its disconnect. Idempotent.
    pub(crate) fn close_peer(&mut self, peer: PeerId, handler: &mut dyn AppHandler) {
        self.session.close_session(peer);
        if let Some(mut connection) = self.registry.remove(peer) {
            connection.mark_closed();
            info!(%peer, "peer connection closed");
            if let Err(error) = handler.server_received(peer, Message::Disconnect) {
                warn!(%peer, %error, "disconnect handler failed");
            }
        }
    }

    /// End the client-side session: leave the lobby, close the host
    /// session, clear the binding, and deliver the one disconnect for
    /// this episode. A repeat call is a no-op.
    pub(crate) fn drop_client_session(&mut self, handler: &mut dyn AppHandler) {
        let ClientState::Connected { lobby, host } = self.client else {
            return;
        };
        self.session.leave_lobby(lobby);
        self.session.close_session(host);
        self.client = ClientState::Disconnected;
        info!(%host, "disconnected from host");
        if let Err(error) = handler.client_received(Message::Disconnect) {
            handler.handle_error(error);
        }
    }

    /// Tear down the session service, exactly once across the explicit
    /// dispose path and drop.
    pub fn shutdown(&mut self) {
        if self.guard.try_begin() {
            info!("shutting down session service");
            self.session.shutdown();
        }
    }
}

impl<S: SessionService, P: NetProvider> Drop for PeerTransport<S, P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
