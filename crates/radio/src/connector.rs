//! Contracts of the collaborators around the datalink

use std::time::Duration;

use async_trait::async_trait;
use vhf_datalink_core::{AtisType, DatalinkError, FlightPhase, Message, Status, WeatherMessage};

/// ATC network: telex, clearances and CPDLC.
///
/// Keeps a mailbox on the server side, so the first poll after connecting
/// returns messages from earlier sessions.
#[async_trait]
pub trait AtcNetwork: Send + Sync {
    async fn connect(&self, callsign: &str) -> Status;

    async fn disconnect(&self) -> Status;

    async fn poll(&self) -> Result<Vec<Message>, DatalinkError>;

    /// Desired time between two polls.
    fn poll_interval(&self) -> Duration;

    /// `force` skips the check whether the receiving station is online.
    async fn send_telex_message(&self, message: &Message, force: bool) -> Status;

    async fn send_cpdlc_message(&self, message: &Message, force: bool) -> Status;

    async fn is_station_available(&self, callsign: &str) -> Status;
}

/// Company network: operational telex and weather services.
#[async_trait]
pub trait CompanyNetwork: Send + Sync {
    async fn connect(&self, flight_number: &str) -> Status;

    async fn disconnect(&self) -> Status;

    async fn poll(&self) -> Result<Vec<Message>, DatalinkError>;

    fn poll_interval(&self) -> Duration;

    async fn send_telex_message(&self, message: &Message) -> Status;

    /// Appends the METAR of `icao` to `message`.
    async fn receive_metar(&self, icao: &str, message: &mut WeatherMessage) -> Status;

    async fn receive_taf(&self, icao: &str, message: &mut WeatherMessage) -> Status;

    async fn receive_atis(&self, icao: &str, kind: AtisType, message: &mut WeatherMessage) -> Status;
}

/// Host aircraft state.
pub trait Aircraft: Send + Sync {
    fn vhf_datalink_powered(&self) -> bool;

    /// `None` while the flight management computer has no valid phase.
    fn current_flight_phase(&self) -> Option<FlightPhase>;
}

/// Application side sink for messages that finished crossing the link.
pub trait MessageRegistry: Send + Sync {
    fn register_messages(&self, messages: Vec<Message>);
}
