//! In-process session service
//!
//! A `MemoryHub` plays the role of the relay backend for every
//! `MemorySession` attached to it: per-peer mailboxes, session
//! admission, and the lobby directory all live behind one mutex. Used
//! for loopback play and for exercising the transport in tests.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use tracing::debug;

use peerlink_core::{LobbyId, PeerId, PeerlinkError, PeerlinkResult};

use crate::{LobbyVisibility, MemberChange, SendMode, SessionEvent, SessionService};

#[derive(Default)]
struct PeerState {
    mailbox: VecDeque<(PeerId, Vec<u8>)>,
    events: VecDeque<SessionEvent>,
    /// Sources whose datagrams flow straight to the mailbox
    accepted: HashSet<PeerId>,
    /// Sources with an outstanding SessionRequest
    requested: HashSet<PeerId>,
    /// Datagrams held until the source is accepted
    held: Vec<(PeerId, Vec<u8>)>,
    lobby: Option<LobbyId>,
}

struct LobbyRecord {
    owner: PeerId,
    visibility: LobbyVisibility,
    member_limit: u32,
    data: BTreeMap<String, String>,
    members: Vec<PeerId>,
}

#[derive(Default)]
struct HubState {
    peers: HashMap<PeerId, PeerState>,
    lobbies: BTreeMap<LobbyId, LobbyRecord>,
    fail_next_lobby_create: bool,
}

/// Shared in-process relay backend
#[derive(Clone, Default)]
pub struct MemoryHub {
    state: Arc<Mutex<HubState>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new endpoint with a fresh peer id
    pub fn attach(&self) -> MemorySession {
        let mut state = self.state.lock();
        let mut rng = rand::thread_rng();
        let peer = loop {
            let candidate = PeerId::new(rng.gen_range(1..u64::from(u32::MAX)));
            if !state.peers.contains_key(&candidate) {
                break candidate;
            }
        };
        state.peers.insert(peer, PeerState::default());
        debug!(%peer, "attached memory session");
        MemorySession {
            hub: self.clone(),
            peer,
            detached: false,
        }
    }

    /// Make the next `create_lobby` resolve as a failure
    pub fn fail_next_lobby_create(&self) {
        self.state.lock().fail_next_lobby_create = true;
    }

    /// Deliver a `SessionConnectFailed` for `failing` to `to`, as the
    /// relay does when a session breaks down asynchronously
    pub fn inject_connect_failure(&self, to: PeerId, failing: PeerId) {
        let mut state = self.state.lock();
        if let Some(peer) = state.peers.get_mut(&to) {
            peer.events
                .push_back(SessionEvent::SessionConnectFailed { peer: failing });
        }
    }

    /// Published metadata of a lobby, if it exists
    pub fn lobby_entries(&self, lobby: LobbyId) -> Option<Vec<(String, String)>> {
        let state = self.state.lock();
        state
            .lobbies
            .get(&lobby)
            .map(|record| record.data.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl HubState {
    fn push_event(&mut self, to: PeerId, event: SessionEvent) {
        if let Some(peer) = self.peers.get_mut(&to) {
            peer.events.push_back(event);
        }
    }

    /// Remove a member from a lobby, dissolving it when the owner
    /// leaves, and notify everyone still present.
    fn depart_lobby(&mut self, lobby_id: LobbyId, member: PeerId, change: MemberChange) {
        let Some(record) = self.lobbies.get_mut(&lobby_id) else {
            return;
        };
        record.members.retain(|m| *m != member);
        let remaining = record.members.clone();
        let dissolve = record.owner == member;
        if dissolve {
            self.lobbies.remove(&lobby_id);
        }

        if let Some(peer) = self.peers.get_mut(&member) {
            if peer.lobby == Some(lobby_id) {
                peer.lobby = None;
            }
        }
        for other in remaining {
            self.push_event(
                other,
                SessionEvent::MemberStateChanged {
                    lobby: lobby_id,
                    member,
                    change,
                },
            );
        }
    }

    fn detach_peer(&mut self, peer: PeerId) {
        let lobby = self.peers.get(&peer).and_then(|p| p.lobby);
        if let Some(lobby_id) = lobby {
            self.depart_lobby(lobby_id, peer, MemberChange::Disconnected);
        }
        self.peers.remove(&peer);
        for other in self.peers.values_mut() {
            other.accepted.remove(&peer);
            other.requested.remove(&peer);
            other.held.retain(|(from, _)| *from != peer);
        }
    }
}

/// One endpoint attached to a [`MemoryHub`]
pub struct MemorySession {
    hub: MemoryHub,
    peer: PeerId,
    detached: bool,
}

impl MemorySession {
    /// The peer id the hub assigned to this endpoint
    pub fn peer_id(&self) -> PeerId {
        self.peer
    }

    /// The hub this endpoint is attached to
    pub fn hub(&self) -> &MemoryHub {
        &self.hub
    }
}

impl SessionService for MemorySession {
    fn send(&mut self, peer: PeerId, payload: &[u8], _mode: SendMode) -> PeerlinkResult<()> {
        let mut state = self.hub.state.lock();
        let from = self.peer;
        if !state.peers.contains_key(&peer) {
            return Err(PeerlinkError::SessionClosed(peer));
        }
        // Sending opens our side: return traffic from the target flows
        // without a request.
        if let Some(me) = state.peers.get_mut(&from) {
            me.accepted.insert(peer);
        }
        let Some(target) = state.peers.get_mut(&peer) else {
            return Err(PeerlinkError::SessionClosed(peer));
        };

        if target.accepted.contains(&from) {
            target.mailbox.push_back((from, payload.to_vec()));
        } else {
            // First contact: raise a session request once and hold the
            // datagram until the target accepts.
            target.held.push((from, payload.to_vec()));
            if target.requested.insert(from) {
                target
                    .events
                    .push_back(SessionEvent::SessionRequest { peer: from });
            }
        }
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Option<(PeerId, usize)> {
        let mut state = self.hub.state.lock();
        let mailbox = &mut state.peers.get_mut(&self.peer)?.mailbox;
        let (from, payload) = mailbox.pop_front()?;
        let len = payload.len().min(buf.len());
        buf[..len].copy_from_slice(&payload[..len]);
        Some((from, len))
    }

    fn accept_session(&mut self, peer: PeerId) {
        let mut state = self.hub.state.lock();
        let Some(me) = state.peers.get_mut(&self.peer) else {
            return;
        };
        me.accepted.insert(peer);
        me.requested.remove(&peer);
        // Flush held datagrams from that source, preserving order
        let mut kept = Vec::new();
        for (from, payload) in me.held.drain(..) {
            if from == peer {
                me.mailbox.push_back((from, payload));
            } else {
                kept.push((from, payload));
            }
        }
        me.held = kept;
    }

    fn close_session(&mut self, peer: PeerId) {
        let mut state = self.hub.state.lock();
        if let Some(me) = state.peers.get_mut(&self.peer) {
            me.accepted.remove(&peer);
            me.requested.remove(&peer);
            me.held.retain(|(from, _)| *from != peer);
            me.mailbox.retain(|(from, _)| *from != peer);
        }
        // Drop our standing on the other side so a later datagram from
        // us raises a fresh request.
        if let Some(other) = state.peers.get_mut(&peer) {
            other.accepted.remove(&self.peer);
        }
    }

    fn create_lobby(&mut self, visibility: LobbyVisibility, member_limit: u32) {
        let mut state = self.hub.state.lock();
        if state.fail_next_lobby_create {
            state.fail_next_lobby_create = false;
            state.push_event(self.peer, SessionEvent::LobbyCreated { lobby: None });
            return;
        }

        let mut rng = rand::thread_rng();
        let lobby = loop {
            let candidate = LobbyId::new(rng.gen_range(1..u64::from(u32::MAX)));
            if !state.lobbies.contains_key(&candidate) {
                break candidate;
            }
        };
        state.lobbies.insert(
            lobby,
            LobbyRecord {
                owner: self.peer,
                visibility,
                member_limit,
                data: BTreeMap::new(),
                members: vec![self.peer],
            },
        );
        if let Some(me) = state.peers.get_mut(&self.peer) {
            me.lobby = Some(lobby);
        }
        debug!(%lobby, owner = %self.peer, "lobby created");
        state.push_event(self.peer, SessionEvent::LobbyCreated { lobby: Some(lobby) });
    }

    fn join_lobby(&mut self, lobby: LobbyId) {
        let mut state = self.hub.state.lock();
        let joiner = self.peer;

        let accepted = match state.lobbies.get_mut(&lobby) {
            Some(record) if (record.members.len() as u32) < record.member_limit => {
                record.members.push(joiner);
                Some((record.owner, record.members.clone()))
            }
            _ => None,
        };

        match accepted {
            Some((host, members)) => {
                if let Some(me) = state.peers.get_mut(&joiner) {
                    me.lobby = Some(lobby);
                }
                state.push_event(joiner, SessionEvent::LobbyJoined { lobby, host });
                for member in members {
                    if member != joiner {
                        state.push_event(
                            member,
                            SessionEvent::MemberStateChanged {
                                lobby,
                                member: joiner,
                                change: MemberChange::Entered,
                            },
                        );
                    }
                }
            }
            None => {
                debug!(%lobby, peer = %joiner, "lobby join refused");
                state.push_event(joiner, SessionEvent::LobbyJoinFailed { lobby });
            }
        }
    }

    fn leave_lobby(&mut self, lobby: LobbyId) {
        let mut state = self.hub.state.lock();
        state.depart_lobby(lobby, self.peer, MemberChange::Left);
    }

    fn set_lobby_data(&mut self, lobby: LobbyId, key: &str, value: &str) {
        let mut state = self.hub.state.lock();
        if let Some(record) = state.lobbies.get_mut(&lobby) {
            if record.owner == self.peer {
                record.data.insert(key.to_string(), value.to_string());
            }
        }
    }

    fn set_lobby_member_limit(&mut self, lobby: LobbyId, limit: u32) {
        let mut state = self.hub.state.lock();
        if let Some(record) = state.lobbies.get_mut(&lobby) {
            if record.owner == self.peer {
                record.member_limit = limit;
            }
        }
    }

    fn lobby_data(&self, lobby: LobbyId, key: &str) -> Option<String> {
        let state = self.hub.state.lock();
        state.lobbies.get(&lobby)?.data.get(key).cloned()
    }

    fn request_lobby_list(&mut self, max_results: u32) {
        let mut state = self.hub.state.lock();
        let lobbies: Vec<LobbyId> = state
            .lobbies
            .iter()
            .filter(|(_, record)| record.visibility == LobbyVisibility::Public)
            .map(|(id, _)| *id)
            .take(max_results as usize)
            .collect();
        state.push_event(self.peer, SessionEvent::LobbyList { lobbies });
    }

    fn next_event(&mut self) -> Option<SessionEvent> {
        let mut state = self.hub.state.lock();
        state.peers.get_mut(&self.peer)?.events.pop_front()
    }

    fn shutdown(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        let mut state = self.hub.state.lock();
        state.detach_peer(self.peer);
        debug!(peer = %self.peer, "memory session shut down");
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
