use std::{path::Path, time::Duration};

use bitcoin::{address::NetworkUnchecked, Network};
use serde::Deserialize;

use crate::tracker::TrackerConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    pub network: Network,
    /// Deposit collection address of the bridge.
    pub bridge_address: bitcoin::Address<NetworkUnchecked>,
    pub l1_rpc_url: String,
    pub l2_rpc_url: String,
    #[serde(default)]
    pub tracker: TrackerSection,
    /// Minimum depth of the outputs offered to coin selection.
    #[serde(default = "default_min_confirmations")]
    pub min_confirmations: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TrackerSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_min_confirmations() -> u32 {
    1
}

impl From<TrackerSection> for TrackerConfig {
    fn from(section: TrackerSection) -> Self {
        Self {
            poll_interval: Duration::from_millis(section.poll_interval_ms),
        }
    }
}

impl BridgeConfig {
    pub fn tracker_config(&self) -> TrackerConfig {
        self.tracker.into()
    }

    /// Bridge address checked against the configured network.
    pub fn bridge_address(&self) -> eyre::Result<bitcoin::Address> {
        Ok(self.bridge_address.clone().require_network(self.network)?)
    }
}

/// load bridge config from a toml file
pub fn load_bridge_config(path: impl AsRef<Path>) -> eyre::Result<BridgeConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: BridgeConfig = toml::from_str(&contents)?;
    Ok(config)
}
