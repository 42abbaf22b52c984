use serde::{Deserialize, Serialize};
use tandem_core::{DEFAULT_STUN_ADDR, IceServerConfig};

/// Configuration passed through to the peer-connection engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportConfig {
    #[serde(default = "default_ice_servers")]
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_ice_servers(),
        }
    }
}

fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![IceServerConfig::new([DEFAULT_STUN_ADDR])]
}
