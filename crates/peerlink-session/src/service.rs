//! Session service contract
//!
//! Every call is non-blocking and returns immediately; results of
//! matchmaking operations arrive later through the polled event queue.
//! All calls, including `next_event`, happen on the application tick.

use peerlink_core::{LobbyId, PeerId, PeerlinkResult};

/// Datagram delivery mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendMode {
    /// Fire-and-forget, no delay
    Unreliable,
    /// Ordered, retransmitted delivery
    Reliable,
    /// Reliable delivery that coalesces datagrams; used for large
    /// chunked payloads
    ReliableBuffered,
}

/// Lobby visibility at creation time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LobbyVisibility {
    /// Listed by discovery requests
    Public,
    /// Joinable by id only
    Private,
}

/// How a lobby member's state changed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberChange {
    Entered,
    Left,
    Disconnected,
}

/// Asynchronous resolution delivered by the session service
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A `create_lobby` request resolved; `None` means the service
    /// refused and the host stays direct-only.
    LobbyCreated { lobby: Option<LobbyId> },
    /// A `join_lobby` request resolved with the lobby's host.
    LobbyJoined { lobby: LobbyId, host: PeerId },
    /// A `join_lobby` request was refused (missing lobby, full lobby).
    LobbyJoinFailed { lobby: LobbyId },
    /// A `request_lobby_list` request resolved.
    LobbyList { lobbies: Vec<LobbyId> },
    /// A member of a lobby we are in changed state.
    MemberStateChanged {
        lobby: LobbyId,
        member: PeerId,
        change: MemberChange,
    },
    /// A remote peer wants to open a datagram session with us.
    SessionRequest { peer: PeerId },
    /// The session with a peer failed; pending traffic was dropped.
    SessionConnectFailed { peer: PeerId },
}

/// The peer-to-peer relay/NAT-traversal subsystem peerlink runs on.
///
/// Encryption, authentication, and traversal mechanics live behind this
/// boundary. The service offers no liveness probe for a peer; liveness
/// is learned from send failures and from `SessionConnectFailed` /
/// `MemberStateChanged` events.
pub trait SessionService {
    /// Send one datagram to a peer. An error is local and immediate
    /// (unknown peer, service rejection); successful return says nothing
    /// about delivery.
    fn send(&mut self, peer: PeerId, payload: &[u8], mode: SendMode) -> PeerlinkResult<()>;

    /// Pop the next pending inbound datagram into `buf`, returning the
    /// sender and payload length. `None` when drained.
    fn recv(&mut self, buf: &mut [u8]) -> Option<(PeerId, usize)>;

    /// Accept a session requested via [`SessionEvent::SessionRequest`];
    /// held datagrams from that peer become receivable.
    fn accept_session(&mut self, peer: PeerId);

    /// End the session with a peer, dropping held traffic. A later
    /// datagram from the same peer raises a fresh `SessionRequest`.
    fn close_session(&mut self, peer: PeerId);

    /// Ask the directory to create a lobby owned by this peer.
    /// Resolves via [`SessionEvent::LobbyCreated`].
    fn create_lobby(&mut self, visibility: LobbyVisibility, member_limit: u32);

    /// Ask to join a lobby by id. Resolves via `LobbyJoined` or
    /// `LobbyJoinFailed`.
    fn join_lobby(&mut self, lobby: LobbyId);

    /// Leave a lobby. Leaving as owner dissolves it.
    fn leave_lobby(&mut self, lobby: LobbyId);

    /// Publish one metadata key. Only the lobby owner's writes stick.
    fn set_lobby_data(&mut self, lobby: LobbyId, key: &str, value: &str);

    /// Update the advertised member limit.
    fn set_lobby_member_limit(&mut self, lobby: LobbyId, limit: u32);

    /// Read one published metadata key.
    fn lobby_data(&self, lobby: LobbyId, key: &str) -> Option<String>;

    /// Request a bounded list of public lobbies. Resolves via
    /// [`SessionEvent::LobbyList`].
    fn request_lobby_list(&mut self, max_results: u32);

    /// Pop the next pending event. `None` when drained.
    fn next_event(&mut self) -> Option<SessionEvent>;

    /// Tear the service down. Callers guard this so it runs at most
    /// once per process.
    fn shutdown(&mut self);
}
