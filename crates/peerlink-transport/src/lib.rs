//! peerlink Transport - Relay transport facade
//!
//! This crate implements the pluggable transport layer:
//! - `PeerTransport`, the facade presenting the abstract transport
//!   contract over a relay session service, with a wrapped direct
//!   transport as fallback
//! - Per-peer `Connection` records and the `SessionRegistry`
//! - Lobby directory dispatch (create, publish, list, join, member
//!   changes)
//! - The application-facing contracts (`NetProvider`, `AppHandler`,
//!   `StatusSource`)
//! - Exactly-once shutdown guarding

pub mod connection;
pub mod contract;
pub mod facade;
pub mod lobby;
pub mod registry;
pub mod shutdown;

pub use connection::*;
pub use contract::*;
pub use facade::*;
pub use lobby::*;
pub use registry::*;
pub use shutdown::*;

#[cfg(test)]
pub(crate) mod testutil;
