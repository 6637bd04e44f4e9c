//! peerlink Wire - Binary packet format
//!
//! This crate implements the datagram payload format for peerlink:
//! - Length frame (u16, LE)
//! - Kind tag (1 byte)
//! - Message body
//!
//! The session service imposes no framing beyond a single datagram
//! boundary, so an encoded message must fit one packet buffer.

pub mod codec;

pub use codec::*;
