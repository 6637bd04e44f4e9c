//! Identity types for peerlink
//!
//! All identifiers are 64-bit, assigned by the underlying session
//! service. They are opaque to this layer: stable for the lifetime of a
//! session and never reused while a connection is registered.

use std::fmt;

/// Remote party identity on the session service
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct PeerId(pub u64);

impl PeerId {
    pub const ZERO: PeerId = PeerId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        PeerId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        PeerId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Peer({})", self.0)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discoverable lobby identity on the matchmaking directory
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct LobbyId(pub u64);

impl LobbyId {
    #[inline]
    pub fn new(id: u64) -> Self {
        LobbyId(id)
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        LobbyId(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lobby({})", self.0)
    }
}

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_roundtrip() {
        let id = PeerId::new(0xDEADBEEF_CAFEBABE);
        let bytes = id.to_bytes();
        let recovered = PeerId::from_bytes(bytes);
        assert_eq!(id, recovered);
    }

    #[test]
    fn test_display_is_decimal() {
        // Dial addresses embed the decimal form, so Display must match it.
        assert_eq!(LobbyId::new(123456789).to_string(), "123456789");
        assert_eq!(PeerId::new(42).to_string(), "42");
    }
}
