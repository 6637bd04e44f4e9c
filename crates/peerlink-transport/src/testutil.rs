//! Recording fakes for facade tests

use std::cell::Cell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use peerlink_core::{
    DiscoveredServer, LobbyId, Message, PeerId, PeerlinkError, PeerlinkResult,
};
use peerlink_session::{LobbyVisibility, SendMode, SessionEvent, SessionService};

use crate::{
    AppHandler, ConnectionInfo, DialCallback, DiscoverCallback, DiscoverDone, NetProvider,
    PingCallback, PingFailed, StatusSource,
};

/// Canned game state
pub struct FixedStatus {
    pub name: String,
    pub description: Option<String>,
    pub map: String,
    pub version: String,
    pub version_type: String,
    pub wave: u32,
    pub game_mode: String,
}

impl Default for FixedStatus {
    fn default() -> Self {
        FixedStatus {
            name: "Test Server".into(),
            description: None,
            map: "Ground Zero".into(),
            version: "146".into(),
            version_type: "official".into(),
            wave: 1,
            game_mode: "survival".into(),
        }
    }
}

impl StatusSource for FixedStatus {
    fn server_name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn map_name(&self) -> String {
        self.map.clone()
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn version_type(&self) -> String {
        self.version_type.clone()
    }

    fn wave(&self) -> u32 {
        self.wave
    }

    fn game_mode(&self) -> String {
        self.game_mode.clone()
    }
}

/// Session service fake that records every call and replays scripted
/// events and datagrams on demand.
#[derive(Default)]
pub struct RecordingSession {
    pub sent: Vec<(PeerId, Vec<u8>, SendMode)>,
    pub fail_sends_to: HashSet<PeerId>,
    pub inbound: VecDeque<(PeerId, Vec<u8>)>,
    pub events: VecDeque<SessionEvent>,
    pub accepted: Vec<PeerId>,
    pub closed: Vec<PeerId>,
    pub created: Vec<(LobbyVisibility, u32)>,
    pub joined: Vec<LobbyId>,
    pub left: Vec<LobbyId>,
    pub data_writes: Vec<(LobbyId, String, String)>,
    pub limit_writes: Vec<(LobbyId, u32)>,
    pub list_requests: Vec<u32>,
    pub directory: HashMap<(LobbyId, String), String>,
    pub shutdowns: Rc<Cell<usize>>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter handle that outlives the facade, for drop tests
    pub fn shutdown_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.shutdowns)
    }

    pub fn push_event(&mut self, event: SessionEvent) {
        self.events.push_back(event);
    }

    pub fn push_inbound(&mut self, from: PeerId, payload: Vec<u8>) {
        self.inbound.push_back((from, payload));
    }

    pub fn publish(&mut self, lobby: LobbyId, key: &str, value: &str) {
        self.directory
            .insert((lobby, key.to_string()), value.to_string());
    }

    /// Send modes recorded so far, in order
    pub fn sent_modes(&self) -> Vec<SendMode> {
        self.sent.iter().map(|(_, _, mode)| *mode).collect()
    }
}

impl SessionService for RecordingSession {
    fn send(&mut self, peer: PeerId, payload: &[u8], mode: SendMode) -> PeerlinkResult<()> {
        if self.fail_sends_to.contains(&peer) {
            return Err(PeerlinkError::SendRejected(format!("peer {peer} unreachable")));
        }
        self.sent.push((peer, payload.to_vec(), mode));
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Option<(PeerId, usize)> {
        let (from, payload) = self.inbound.pop_front()?;
        let len = payload.len().min(buf.len());
        buf[..len].copy_from_slice(&payload[..len]);
        Some((from, len))
    }

    fn accept_session(&mut self, peer: PeerId) {
        self.accepted.push(peer);
    }

    fn close_session(&mut self, peer: PeerId) {
        self.closed.push(peer);
    }

    fn create_lobby(&mut self, visibility: LobbyVisibility, member_limit: u32) {
        self.created.push((visibility, member_limit));
    }

    fn join_lobby(&mut self, lobby: LobbyId) {
        self.joined.push(lobby);
    }

    fn leave_lobby(&mut self, lobby: LobbyId) {
        self.left.push(lobby);
    }

    fn set_lobby_data(&mut self, lobby: LobbyId, key: &str, value: &str) {
        self.directory
            .insert((lobby, key.to_string()), value.to_string());
        self.data_writes
            .push((lobby, key.to_string(), value.to_string()));
    }

    fn set_lobby_member_limit(&mut self, lobby: LobbyId, limit: u32) {
        self.limit_writes.push((lobby, limit));
    }

    fn lobby_data(&self, lobby: LobbyId, key: &str) -> Option<String> {
        self.directory.get(&(lobby, key.to_string())).cloned()
    }

    fn request_lobby_list(&mut self, max_results: u32) {
        self.list_requests.push(max_results);
    }

    fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    fn shutdown(&mut self) {
        self.shutdowns.set(self.shutdowns.get() + 1);
    }
}

/// Direct-transport fake that records every delegated call
#[derive(Default)]
pub struct RecordingProvider {
    pub dialed: Vec<(String, u16)>,
    pub sent: Vec<(Message, bool)>,
    pub client_disconnects: usize,
    pub discoveries: usize,
    /// Entries handed to the discovery callback on each pass
    pub discoverable: Vec<DiscoveredServer>,
    pub hosted: Vec<u16>,
    pub fail_host: bool,
    pub server_closes: usize,
    pub pings: Vec<(String, u16)>,
    pub live: Vec<ConnectionInfo>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NetProvider for RecordingProvider {
    fn dial(&mut self, address: &str, port: u16, on_success: DialCallback) -> PeerlinkResult<()> {
        self.dialed.push((address.to_string(), port));
        on_success();
        Ok(())
    }

    fn send(&mut self, message: &Message, reliable: bool) {
        self.sent.push((message.clone(), reliable));
    }

    fn disconnect_client(&mut self) {
        self.client_disconnects += 1;
    }

    fn discover_servers(&mut self, mut callback: DiscoverCallback, done: DiscoverDone) {
        self.discoveries += 1;
        for entry in self.discoverable.clone() {
            callback(entry);
        }
        done();
    }

    fn ping_host(
        &mut self,
        address: &str,
        port: u16,
        _on_valid: PingCallback,
        _on_failed: PingFailed,
    ) {
        self.pings.push((address.to_string(), port));
    }

    fn host_server(&mut self, port: u16) -> PeerlinkResult<()> {
        if self.fail_host {
            return Err(PeerlinkError::TransportError(format!(
                "port {port} unavailable"
            )));
        }
        self.hosted.push(port);
        Ok(())
    }

    fn close_server(&mut self) {
        self.server_closes += 1;
    }

    fn connections(&self) -> Vec<ConnectionInfo> {
        self.live.clone()
    }
}

/// Handler fake collecting both event streams and routed errors
#[derive(Default)]
pub struct CollectingHandler {
    pub server_events: Vec<(PeerId, Message)>,
    pub client_events: Vec<Message>,
    pub errors: Vec<PeerlinkError>,
    pub fail_server: bool,
    pub fail_client: bool,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many disconnects the server stream saw for a peer
    pub fn server_disconnects(&self, peer: PeerId) -> usize {
        self.server_events
            .iter()
            .filter(|(p, m)| *p == peer && matches!(m, Message::Disconnect))
            .count()
    }

    /// How many connects the server stream saw for a peer
    pub fn server_connects(&self, peer: PeerId) -> usize {
        self.server_events
            .iter()
            .filter(|(p, m)| *p == peer && matches!(m, Message::Connect { .. }))
            .count()
    }

    pub fn client_disconnects(&self) -> usize {
        self.client_events
            .iter()
            .filter(|m| matches!(m, Message::Disconnect))
            .count()
    }
}

impl AppHandler for CollectingHandler {
    fn server_received(&mut self, peer: PeerId, message: Message) -> PeerlinkResult<()> {
        self.server_events.push((peer, message));
        if self.fail_server {
            return Err(PeerlinkError::Handler("server handler rejected".into()));
        }
        Ok(())
    }

    fn client_received(&mut self, message: Message) -> PeerlinkResult<()> {
        self.client_events.push(message);
        if self.fail_client {
            return Err(PeerlinkError::Handler("client handler rejected".into()));
        }
        Ok(())
    }

    fn handle_error(&mut self, error: PeerlinkError) {
        self.errors.push(error);
    }
}
