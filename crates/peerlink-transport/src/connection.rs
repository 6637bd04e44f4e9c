//! Per-peer connection records and delivery policy

use peerlink_core::{Message, PeerId};
use peerlink_session::SendMode;

/// Encoded length at which delivery escalates to reliable regardless of
/// the caller's request; the practical single-datagram safety margin.
pub const RELIABLE_THRESHOLD: usize = 1200;

/// One registered peer connection.
///
/// Created on a server's first inbound packet from the peer (implicit
/// connect). The connection is closed and removed from the registry
/// before its peer id may be seen as a fresh connect again.
#[derive(Debug)]
pub struct Connection {
    peer: PeerId,
    connected: bool,
}

impl Connection {
    pub(crate) fn new(peer: PeerId) -> Self {
        Connection {
            peer,
            connected: true,
        }
    }

    /// The remote party this connection is bound to
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Transport address of the peer, e.g. `peer:42`
    pub fn address(&self) -> String {
        format!("peer:{}", self.peer)
    }

    /// Best-effort liveness. The session service has no liveness probe
    /// at this layer, so this reports true for as long as the connection
    /// is registered; actual liveness is learned from send failures and
    /// session events.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn mark_closed(&mut self) {
        self.connected = false;
    }
}

/// Delivery mode for one encoded message. Reliability escalates when
/// requested or when the frame is too large to risk as a single
/// unreliable datagram; stream chunks additionally buffer to avoid
/// datagram storms.
pub fn delivery_mode(message: &Message, encoded_len: usize, reliable: bool) -> SendMode {
    if reliable || encoded_len >= RELIABLE_THRESHOLD {
        if message.is_stream_chunk() {
            SendMode::ReliableBuffered
        } else {
            SendMode::Reliable
        }
    } else {
        SendMode::Unreliable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Message {
        Message::Payload {
            channel: 0,
            data: Vec::new(),
        }
    }

    fn chunk() -> Message {
        Message::StreamChunk {
            stream: 0,
            data: Vec::new(),
        }
    }

    #[test]
    fn test_small_unreliable_stays_unreliable() {
        assert_eq!(delivery_mode(&payload(), 1199, false), SendMode::Unreliable);
    }

    #[test]
    fn test_threshold_escalates() {
        assert_eq!(delivery_mode(&payload(), 1200, false), SendMode::Reliable);
    }

    #[test]
    fn test_requested_reliability_honored_below_threshold() {
        assert_eq!(delivery_mode(&payload(), 10, true), SendMode::Reliable);
    }

    #[test]
    fn test_stream_chunks_buffer_when_reliable() {
        assert_eq!(
            delivery_mode(&chunk(), 5000, false),
            SendMode::ReliableBuffered
        );
        assert_eq!(delivery_mode(&chunk(), 10, true), SendMode::ReliableBuffered);
        // Small unreliable chunks are left alone
        assert_eq!(delivery_mode(&chunk(), 10, false), SendMode::Unreliable);
    }

    #[test]
    fn test_connection_address() {
        let connection = Connection::new(PeerId::new(42));
        assert_eq!(connection.address(), "peer:42");
        assert!(connection.is_connected());
    }
}
