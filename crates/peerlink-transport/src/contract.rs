//! Application-facing contracts
//!
//! `NetProvider` is the abstract transport contract the application
//! already depends on for direct connections; `PeerTransport` consumes a
//! wrapped provider through it and mirrors its surface. `AppHandler`
//! receives the per-role event streams, and `StatusSource` is the narrow
//! window onto game state the lobby directory publishes from.

use peerlink_core::{DiscoveredServer, Message, PeerId, PeerlinkError, PeerlinkResult};

/// Fired once when a dial completes
pub type DialCallback = Box<dyn FnOnce()>;

/// Receives each discovered server during a discovery pass
pub type DiscoverCallback = Box<dyn FnMut(DiscoveredServer)>;

/// Fired once when a discovery pass (relay and direct) is exhausted
pub type DiscoverDone = Box<dyn FnOnce()>;

/// Fired with the probed host on a successful ping
pub type PingCallback = Box<dyn FnOnce(DiscoveredServer)>;

/// Fired when a ping fails
pub type PingFailed = Box<dyn FnOnce(PeerlinkError)>;

/// Snapshot of one live connection, for listings and admin queries
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub address: String,
}

/// The abstract transport contract
pub trait NetProvider {
    /// Connect to a server as a client
    fn dial(&mut self, address: &str, port: u16, on_success: DialCallback) -> PeerlinkResult<()>;

    /// Send a message to the connected server
    fn send(&mut self, message: &Message, reliable: bool);

    /// Drop the client-side connection
    fn disconnect_client(&mut self);

    /// Discover reachable servers, then signal completion
    fn discover_servers(&mut self, callback: DiscoverCallback, done: DiscoverDone);

    /// Probe one host
    fn ping_host(
        &mut self,
        address: &str,
        port: u16,
        on_valid: PingCallback,
        on_failed: PingFailed,
    );

    /// Open the local listener
    fn host_server(&mut self, port: u16) -> PeerlinkResult<()>;

    /// Close the local listener and all its connections
    fn close_server(&mut self);

    /// Snapshot of live connections
    fn connections(&self) -> Vec<ConnectionInfo>;
}

/// Receives transport events on the application side.
///
/// Lifecycle is delivered in-band: a server sees `Message::Connect` once
/// per implicit connect before that peer's first message, and exactly
/// one `Message::Disconnect` per departure; a client sees one
/// `Message::Disconnect` per lost session. A returned error is contained
/// per message: server-side it is logged, client-side it is routed to
/// `handle_error`. One bad message never stops the poll drain.
pub trait AppHandler {
    fn server_received(&mut self, peer: PeerId, message: Message) -> PeerlinkResult<()>;

    fn client_received(&mut self, message: Message) -> PeerlinkResult<()>;

    fn handle_error(&mut self, error: PeerlinkError);
}

/// The game-state window the lobby directory publishes from
pub trait StatusSource {
    fn server_name(&self) -> String;

    /// Extra description shown under the name; `None` hides it
    fn description(&self) -> Option<String>;

    fn map_name(&self) -> String;

    fn version(&self) -> String;

    fn version_type(&self) -> String;

    fn wave(&self) -> u32;

    fn game_mode(&self) -> String;
}
