//! VHF datalink: link timing simulation, inbound polling and outbound routing

use std::ops::RangeInclusive;
use std::time::Duration;
use serde::{Deserialize, Serialize};

pub mod connector;
pub mod datalink;
pub mod exchange;
pub mod routing;
pub mod scheduler;
pub mod vdl;

#[cfg(test)]
mod mock;

pub use connector::{Aircraft, AtcNetwork, CompanyNetwork, MessageRegistry};
pub use datalink::{Datalink, WeatherReply};
pub use exchange::{Exchange, ExchangeState};
pub use routing::{route, Route};
pub use scheduler::{DueActions, PollScheduler, PollTimer};
pub use vdl::{LinkCondition, LinkStats, Transmission, TransmissionId, Vdl};

/// VHF channel parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Raw channel bit rate shared by every aircraft in range.
    pub bitrate_bps: u32,
    /// Payload bytes carried by one frame.
    pub packet_size: usize,
    pub propagation_delay: Duration,
    /// Standard deviation of the jitter term; zero disables jitter.
    pub latency_jitter: Duration,
    /// Aircraft sharing the channel around an airport.
    pub airport_users: RangeInclusive<u32>,
    /// Aircraft sharing the channel in climb and descent.
    pub terminal_users: RangeInclusive<u32>,
    /// Aircraft sharing the channel in cruise.
    pub enroute_users: RangeInclusive<u32>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bitrate_bps: 31_500,
            packet_size: 128,
            propagation_delay: Duration::from_millis(50),
            latency_jitter: Duration::from_millis(100),
            airport_users: 60..=120,
            terminal_users: 30..=60,
            enroute_users: 5..=25,
        }
    }
}

/// Orchestrator timing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatalinkConfig {
    /// Period of the poll scheduler.
    pub tick: Duration,
    /// How often the link condition follows the flight phase.
    pub link_refresh_interval: Duration,
    /// Lower bound of the simulated remote processing time, inclusive.
    pub processing_delay_min: Duration,
    /// Upper bound of the simulated remote processing time, exclusive.
    pub processing_delay_max: Duration,
    pub link: LinkConfig,
}

impl Default for DatalinkConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(5_000),
            link_refresh_interval: Duration::from_millis(30_000),
            processing_delay_min: Duration::from_millis(300),
            processing_delay_max: Duration::from_millis(800),
            link: LinkConfig::default(),
        }
    }
}
