//! Lobby metadata schema
//!
//! A lobby is a discoverable group record published by a host. Its
//! metadata is a string-keyed mapping with a fixed six-key schema;
//! consumers must treat unknown or missing keys as absent, not as an
//! error.

use crate::LobbyId;

/// Key for the server name (plus optional description on a second line)
pub const KEY_NAME: &str = "name";
/// Key for the currently loaded map
pub const KEY_MAPNAME: &str = "mapname";
/// Key for the build version
pub const KEY_VERSION: &str = "version";
/// Key for the build channel
pub const KEY_VERSION_TYPE: &str = "versionType";
/// Key for the current wave
pub const KEY_WAVE: &str = "wave";
/// Key for the active game mode
pub const KEY_GAMEMODE: &str = "gamemode";

/// Member limit published when the host configures "unlimited" (0)
pub const UNLIMITED_MEMBER_LIMIT: u32 = 250;

/// The published description of a hosted game
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LobbyMetadata {
    pub name: String,
    pub mapname: String,
    pub version: String,
    pub version_type: String,
    pub wave: String,
    pub gamemode: String,
}

impl LobbyMetadata {
    /// Schema entries in publication order
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            (KEY_NAME, &self.name),
            (KEY_MAPNAME, &self.mapname),
            (KEY_VERSION, &self.version),
            (KEY_VERSION_TYPE, &self.version_type),
            (KEY_WAVE, &self.wave),
            (KEY_GAMEMODE, &self.gamemode),
        ]
    }

    /// Build metadata from published key/value pairs. Unknown keys are
    /// ignored and missing keys stay empty.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut data = LobbyMetadata::default();
        for (key, value) in entries {
            match key {
                KEY_NAME => data.name = value.to_string(),
                KEY_MAPNAME => data.mapname = value.to_string(),
                KEY_VERSION => data.version = value.to_string(),
                KEY_VERSION_TYPE => data.version_type = value.to_string(),
                KEY_WAVE => data.wave = value.to_string(),
                KEY_GAMEMODE => data.gamemode = value.to_string(),
                _ => {}
            }
        }
        data
    }
}

/// Effective lobby member limit for a configured player limit.
/// 0 means "unlimited" and maps to [`UNLIMITED_MEMBER_LIMIT`]; otherwise
/// one slot is reserved for the host.
#[inline]
pub fn member_limit(player_limit: u32) -> u32 {
    if player_limit == 0 {
        UNLIMITED_MEMBER_LIMIT
    } else {
        player_limit + 1
    }
}

/// A discovered game host: either a relay lobby (`peer:<lobby-id>`) or a
/// direct-network server, in the shape lobby-list consumers display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredServer {
    /// Dial address for this host
    pub address: String,
    /// Published metadata (absent keys are empty strings)
    pub metadata: LobbyMetadata,
}

impl DiscoveredServer {
    /// Build the relay entry for a discovered lobby
    pub fn relay(lobby: LobbyId, metadata: LobbyMetadata) -> Self {
        DiscoveredServer {
            address: format!("peer:{lobby}"),
            metadata,
        }
    }
}
