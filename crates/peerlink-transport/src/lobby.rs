//! Lobby directory
//!
//! Resolves session-service events into facade and registry actions:
//! lobby creation, metadata publication, discovery lists, join
//! resolution, and member departures. Only the host publishes metadata;
//! clients never write lobby data.

use tracing::{debug, info, warn};

use peerlink_core::{
    member_limit, DiscoveredServer, LobbyId, LobbyMetadata, PeerId, PeerlinkError,
    TransportConfig, KEY_GAMEMODE, KEY_MAPNAME, KEY_NAME, KEY_VERSION, KEY_VERSION_TYPE, KEY_WAVE,
};
use peerlink_session::{MemberChange, SessionEvent, SessionService};

use crate::{AppHandler, ClientState, NetProvider, PeerTransport, StatusSource};

/// Effective lobby member limit for the configured player limit
pub fn member_limit_for(config: &TransportConfig) -> u32 {
    member_limit(config.player_limit)
}

/// Published lobby name: server name, with the description on a second
/// line when present
pub fn lobby_name(status: &dyn StatusSource) -> String {
    match status.description() {
        Some(description) => format!("{}\n{}", status.server_name(), description),
        None => status.server_name(),
    }
}

/// The full metadata schema read from game state
pub fn status_metadata(status: &dyn StatusSource) -> LobbyMetadata {
    LobbyMetadata {
        name: lobby_name(status),
        mapname: status.map_name(),
        version: status.version(),
        version_type: status.version_type(),
        wave: status.wave().to_string(),
        gamemode: status.game_mode(),
    }
}

impl<S: SessionService, P: NetProvider> PeerTransport<S, P> {
    pub(crate) fn dispatch_session_event(
        &mut self,
        event: SessionEvent,
        handler: &mut dyn AppHandler,
        status: &dyn StatusSource,
    ) {
        match event {
            SessionEvent::LobbyCreated { lobby } => self.on_lobby_created(lobby, status),
            SessionEvent::LobbyJoined { lobby, host } => self.on_lobby_joined(lobby, host),
            SessionEvent::LobbyJoinFailed { lobby } => self.on_lobby_join_failed(lobby, handler),
            SessionEvent::LobbyList { lobbies } => self.on_lobby_list(lobbies),
            SessionEvent::MemberStateChanged {
                lobby,
                member,
                change,
            } => {
                debug!(%lobby, %member, ?change, "lobby member state changed");
                if matches!(change, MemberChange::Left | MemberChange::Disconnected) {
                    if self.server {
                        // A client left the lobby
                        self.close_peer(member, handler);
                    } else if self.client.bound_host() == Some(member) {
                        info!("current host left");
                        self.drop_client_session(handler);
                    }
                }
            }
            SessionEvent::SessionRequest { peer } => {
                // Admission control happens at the application layer via
                // the first-packet connect event; accept at this layer.
                if self.server {
                    info!(%peer, "accepting session request");
                    self.session.accept_session(peer);
                } else {
                    debug!(%peer, "ignoring session request while not hosting");
                }
            }
            SessionEvent::SessionConnectFailed { peer } => {
                if self.server {
                    info!(%peer, "peer session failed");
                    self.close_peer(peer, handler);
                } else if self.client.bound_host() == Some(peer) {
                    info!(%peer, "host session failed");
                    self.drop_client_session(handler);
                }
            }
        }
    }

    fn on_lobby_created(&mut self, lobby: Option<LobbyId>, status: &dyn StatusSource) {
        if !self.server {
            debug!("ignoring lobby creation while not hosting");
            return;
        }
        match lobby {
            Some(lobby) => {
                info!(%lobby, "lobby created");
                self.hosted_lobby = Some(lobby);
                self.publish_lobby_data(status);
            }
            None => {
                // The host keeps running direct-only.
                warn!("lobby creation refused, relay matchmaking disabled");
            }
        }
    }

    fn on_lobby_joined(&mut self, lobby: LobbyId, host: PeerId) {
        if self.client.lobby() != Some(lobby) {
            debug!(%lobby, "ignoring join resolution for stale request");
            return;
        }
        info!(%lobby, %host, "joined lobby");
        self.client = ClientState::Connected { lobby, host };
        if let Some(on_success) = self.pending_join.take() {
            on_success();
        }
    }

    fn on_lobby_join_failed(&mut self, lobby: LobbyId, handler: &mut dyn AppHandler) {
        if self.client.lobby() != Some(lobby) {
            return;
        }
        warn!(%lobby, "lobby join refused");
        self.pending_join = None;
        self.client = ClientState::Idle;
        handler.handle_error(PeerlinkError::LobbyUnavailable(lobby));
    }

    fn on_lobby_list(&mut self, lobbies: Vec<LobbyId>) {
        let Some((mut callback, done)) = self.pending_discovery.take() else {
            debug!("lobby list resolved with no pending discovery");
            return;
        };
        info!(count = lobbies.len(), "lobby list resolved");

        let max = self.config.lobby_results_max as usize;
        for lobby in lobbies.into_iter().take(max) {
            let metadata = self.read_lobby_metadata(lobby);
            callback(DiscoveredServer::relay(lobby, metadata));
        }

        // Relay discovery done; chain the same callbacks into the
        // direct-network pass.
        self.fallback.discover_servers(callback, done);
    }

    fn read_lobby_metadata(&self, lobby: LobbyId) -> LobbyMetadata {
        let keys = [
            KEY_NAME,
            KEY_MAPNAME,
            KEY_VERSION,
            KEY_VERSION_TYPE,
            KEY_WAVE,
            KEY_GAMEMODE,
        ];
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.session.lobby_data(lobby, key) {
                entries.push((key, value));
            }
        }
        LobbyMetadata::from_entries(entries.iter().map(|(k, v)| (*k, v.as_str())))
    }

    /// Publish the full metadata schema and refresh the member limit.
    /// Called on lobby creation, world load, and whenever the host
    /// recomputes its player-facing status. Host-only.
    pub fn publish_lobby_data(&mut self, status: &dyn StatusSource) {
        let Some(lobby) = self.hosted_lobby else {
            return;
        };
        if !self.server {
            return;
        }

        self.session
            .set_lobby_member_limit(lobby, member_limit_for(&self.config));
        let metadata = status_metadata(status);
        for (key, value) in metadata.entries() {
            self.session.set_lobby_data(lobby, key, value);
        }
    }

    /// World finished loading; republish the full schema
    pub fn notify_world_loaded(&mut self, status: &dyn StatusSource) {
        self.publish_lobby_data(status);
    }

    /// Wave advanced; refresh just the wave key
    pub fn notify_wave_changed(&mut self, status: &dyn StatusSource) {
        if let Some(lobby) = self.hosted_lobby {
            if self.server {
                self.session
                    .set_lobby_data(lobby, KEY_WAVE, &status.wave().to_string());
            }
        }
    }
}
