//! peerlink Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout peerlink:
//! - Identifiers (PeerId, LobbyId)
//! - The application message model
//! - Lobby metadata schema
//! - Transport configuration
//! - Error taxonomy

pub mod config;
pub mod error;
pub mod id;
pub mod lobby;
pub mod message;

pub use config::*;
pub use error::*;
pub use id::*;
pub use lobby::*;
pub use message::*;
