//! Transport configuration

/// Transport facade configuration
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Player limit for hosted games; 0 means unlimited
    pub player_limit: u32,
    /// Maximum lobby-list results per discovery request
    pub lobby_results_max: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            player_limit: 0,
            lobby_results_max: 32,
        }
    }
}
