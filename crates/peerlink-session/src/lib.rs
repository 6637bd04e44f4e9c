//! peerlink Session - The relay session-service boundary
//!
//! This crate defines the contract peerlink expects from the underlying
//! peer-to-peer relay/NAT-traversal subsystem:
//! - Best-effort datagram send/recv with a reliability mode
//! - Session admission (accept/close)
//! - Lobby create/join/leave, metadata, and bounded listing
//! - A polled event queue for asynchronous resolutions
//!
//! `MemorySession` is a complete in-process implementation backed by a
//! shared `MemoryHub`, used for loopback play and tests.

pub mod memory;
pub mod service;

pub use memory::*;
pub use service::*;
