//! Packet codec
//!
//! Frame = [length: u16 LE][kind: u8][body]. The length counts the kind
//! byte plus the body, so a whole frame is `length + 2` bytes.
//!
//! Encoding reuses one fixed-capacity buffer; callers must not retain
//! the returned slice past the call. Decoding rejects malformed input
//! with an error the caller silently discards: inbound corruption from a
//! non-conforming or malicious peer must never take down the poll loop.

use bytes::{Buf, BufMut};

use peerlink_core::{Message, PeerlinkError, PeerlinkResult};

/// Packet buffer capacity; the practical ceiling for one encoded message
pub const MAX_PACKET_SIZE: usize = 16384;

/// Frame prefix size (length field)
pub const FRAME_PREFIX_SIZE: usize = 2;

/// Message kind tags
const KIND_CONNECT: u8 = 0;
const KIND_DISCONNECT: u8 = 1;
const KIND_PAYLOAD: u8 = 2;
const KIND_STREAM_CHUNK: u8 = 3;

/// Reusable message codec
pub struct PacketCodec {
    buf: Vec<u8>,
}

impl PacketCodec {
    /// Create a codec with the standard 16 KiB buffer
    pub fn new() -> Self {
        PacketCodec {
            buf: vec![0u8; MAX_PACKET_SIZE],
        }
    }

    /// Encode a message into the internal buffer and return the framed
    /// bytes. The slice is valid only until the next call.
    pub fn encode(&mut self, message: &Message) -> PeerlinkResult<&[u8]> {
        let body_len = Self::body_size(message);
        let frame_len = FRAME_PREFIX_SIZE + 1 + body_len;
        if frame_len > self.buf.len() {
            return Err(PeerlinkError::MessageTooLarge {
                size: frame_len,
                max: self.buf.len(),
            });
        }

        let mut cursor = &mut self.buf[..frame_len];
        cursor.put_u16_le((1 + body_len) as u16);
        match message {
            Message::Connect { address } => {
                cursor.put_u8(KIND_CONNECT);
                cursor.put_u16_le(address.len() as u16);
                cursor.put_slice(address.as_bytes());
            }
            Message::Disconnect => {
                cursor.put_u8(KIND_DISCONNECT);
            }
            Message::Payload { channel, data } => {
                cursor.put_u8(KIND_PAYLOAD);
                cursor.put_u16_le(*channel);
                cursor.put_slice(data);
            }
            Message::StreamChunk { stream, data } => {
                cursor.put_u8(KIND_STREAM_CHUNK);
                cursor.put_u32_le(*stream);
                cursor.put_slice(data);
            }
        }

        Ok(&self.buf[..frame_len])
    }

    /// Decode one framed message. Any structural defect is an error; the
    /// caller treats it as "not a message" and drops the datagram.
    pub fn decode(bytes: &[u8]) -> PeerlinkResult<Message> {
        let mut cursor = bytes;
        if cursor.remaining() < FRAME_PREFIX_SIZE + 1 {
            return Err(PeerlinkError::BufferTooShort {
                expected: FRAME_PREFIX_SIZE + 1,
                actual: cursor.remaining(),
            });
        }

        let declared = cursor.get_u16_le() as usize;
        if declared != cursor.remaining() {
            return Err(PeerlinkError::FrameLengthMismatch {
                declared,
                actual: cursor.remaining(),
            });
        }

        let kind = cursor.get_u8();
        match kind {
            KIND_CONNECT => {
                if cursor.remaining() < 2 {
                    return Err(PeerlinkError::InvalidMessageBody);
                }
                let len = cursor.get_u16_le() as usize;
                if cursor.remaining() != len {
                    return Err(PeerlinkError::InvalidMessageBody);
                }
                let address = std::str::from_utf8(cursor)
                    .map_err(|_| PeerlinkError::InvalidMessageBody)?
                    .to_string();
                Ok(Message::Connect { address })
            }
            KIND_DISCONNECT => {
                if cursor.has_remaining() {
                    return Err(PeerlinkError::InvalidMessageBody);
                }
                Ok(Message::Disconnect)
            }
            KIND_PAYLOAD => {
                if cursor.remaining() < 2 {
                    return Err(PeerlinkError::InvalidMessageBody);
                }
                let channel = cursor.get_u16_le();
                Ok(Message::Payload {
                    channel,
                    data: cursor.to_vec(),
                })
            }
            KIND_STREAM_CHUNK => {
                if cursor.remaining() < 4 {
                    return Err(PeerlinkError::InvalidMessageBody);
                }
                let stream = cursor.get_u32_le();
                Ok(Message::StreamChunk {
                    stream,
                    data: cursor.to_vec(),
                })
            }
            other => Err(PeerlinkError::UnknownMessageKind(other)),
        }
    }

    fn body_size(message: &Message) -> usize {
        match message {
            Message::Connect { address } => 2 + address.len(),
            Message::Disconnect => 0,
            Message::Payload { data, .. } => 2 + data.len(),
            Message::StreamChunk { data, .. } => 4 + data.len(),
        }
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new()
    }
}
