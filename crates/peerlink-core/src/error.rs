//! Error types for peerlink

use thiserror::Error;

use crate::{LobbyId, PeerId};

/// Core peerlink errors
#[derive(Error, Debug)]
pub enum PeerlinkError {
    // Wire errors
    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Frame length mismatch: declared {declared}, got {actual}")]
    FrameLengthMismatch { declared: usize, actual: usize },

    #[error("Unknown message kind: {0}")]
    UnknownMessageKind(u8),

    #[error("Message too large: {size} > {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Invalid message body")]
    InvalidMessageBody,

    // Addressing errors
    #[error("Invalid peer address: {0}")]
    InvalidAddress(String),

    // Session errors
    #[error("Session closed: peer {0}")]
    SessionClosed(PeerId),

    #[error("Send rejected by session service: {0}")]
    SendRejected(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Lobby unavailable: {0}")]
    LobbyUnavailable(LobbyId),

    // Application handler errors
    #[error("Handler error: {0}")]
    Handler(String),

    // Fallback transport errors
    #[error("Transport error: {0}")]
    TransportError(String),
}

/// Result type for peerlink operations
pub type PeerlinkResult<T> = Result<T, PeerlinkError>;
