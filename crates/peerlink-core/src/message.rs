//! Application message model
//!
//! The transport carries opaque application traffic plus two synthesized
//! lifecycle messages. `Connect` and `Disconnect` are never put on the
//! wire by the transport itself; they are delivered through the same
//! receive path as ordinary messages so the application has a single
//! event stream per role.

use std::fmt;

/// An application-level message moved through the transport
#[derive(Clone, PartialEq, Eq)]
pub enum Message {
    /// Synthesized when a previously-unseen peer sends its first valid
    /// message to a server (implicit connect). Carries the sender's
    /// transport address, e.g. `peer:42`.
    Connect { address: String },
    /// Synthesized exactly once per disconnect episode.
    Disconnect,
    /// Ordinary game traffic on a logical channel.
    Payload { channel: u16, data: Vec<u8> },
    /// One chunk of a large streamed payload. Chunks request
    /// reliable-with-buffering delivery to avoid datagram storms.
    StreamChunk { stream: u32, data: Vec<u8> },
}

impl Message {
    /// Whether this message is part of a large chunked stream
    #[inline]
    pub fn is_stream_chunk(&self) -> bool {
        matches!(self, Message::StreamChunk { .. })
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Connect { address } => write!(f, "Connect({address})"),
            Message::Disconnect => write!(f, "Disconnect"),
            Message::Payload { channel, data } => {
                write!(f, "Payload(ch={channel}, {} bytes)", data.len())
            }
            Message::StreamChunk { stream, data } => {
                write!(f, "StreamChunk(id={stream}, {} bytes)", data.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_chunk_detection() {
        let chunk = Message::StreamChunk {
            stream: 1,
            data: vec![0; 4],
        };
        let payload = Message::Payload {
            channel: 0,
            data: vec![0; 4],
        };

        assert!(chunk.is_stream_chunk());
        assert!(!payload.is_stream_chunk());
        assert!(!Message::Disconnect.is_stream_chunk());
    }
}
