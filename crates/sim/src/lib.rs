//! simulation tools for the VHF datalink

pub mod backends;
pub mod scenarios;

use std::time::Duration;
use vhf_datalink_radio::{DatalinkConfig, LinkConfig};

pub struct SimulationPresets;

impl SimulationPresets {
    pub fn quiet_channel() -> LinkConfig {
        LinkConfig {
            bitrate_bps: 31_500,
            packet_size: 128,
            propagation_delay: Duration::from_millis(20),
            latency_jitter: Duration::from_millis(30),
            airport_users: 10..=20,
            terminal_users: 5..=10,
            enroute_users: 1..=5,
        }
    }

    pub fn average_channel() -> LinkConfig {
        LinkConfig::default()
    }

    pub fn congested_channel() -> LinkConfig {
        LinkConfig {
            bitrate_bps: 31_500,
            packet_size: 128,
            propagation_delay: Duration::from_millis(80),
            latency_jitter: Duration::from_millis(250),
            airport_users: 150..=250,
            terminal_users: 80..=120,
            enroute_users: 30..=60,
        }
    }

    /// Orchestrator timing scaled down so a scripted flight finishes in seconds.
    pub fn fast_forward(link: LinkConfig) -> DatalinkConfig {
        DatalinkConfig {
            tick: Duration::from_millis(250),
            link_refresh_interval: Duration::from_millis(1_500),
            link,
            ..Default::default()
        }
    }
}
