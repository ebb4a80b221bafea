//! In-memory networks and host aircraft for running the datalink offline

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::Mutex;
use vhf_datalink_core::{
    AtisType, DatalinkError, Direction, FlightPhase, Message, MessageType, Network, Status,
    WeatherMessage,
};
use vhf_datalink_radio::{Aircraft, AtcNetwork, CompanyNetwork, MessageRegistry};

/// ATC network with a server-side mailbox and a controller that answers
/// clearance requests.
pub struct SimAtcNetwork {
    poll_interval: Duration,
    stations: HashSet<String>,
    callsign: Mutex<Option<String>>,
    mailbox: Mutex<Vec<Message>>,
    outbox: Mutex<Vec<Message>>,
}

impl SimAtcNetwork {
    pub fn new(poll_interval: Duration, stations: &[&str]) -> Self {
        Self {
            poll_interval,
            stations: stations.iter().map(|s| s.to_string()).collect(),
            callsign: Mutex::new(None),
            mailbox: Mutex::new(Vec::new()),
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Leaves a message in the mailbox, delivered on the next poll.
    pub async fn post(&self, message: Message) {
        self.mailbox.lock().await.push(message);
    }

    pub async fn sent(&self) -> Vec<Message> {
        self.outbox.lock().await.clone()
    }

    fn answer(&self, request: &Message) -> Option<Message> {
        match request.kind {
            MessageType::Dcl => Some(Message::new(
                MessageType::Dcl,
                Network::Atc,
                Direction::Uplink,
                request.station.clone(),
                "CLEARED TO DESTINATION VIA FILED ROUTE, CLIMB 5000FT, SQUAWK 4521",
            )),
            MessageType::Cpdlc => Some(Message::new(
                MessageType::Cpdlc,
                Network::Atc,
                Direction::Uplink,
                request.station.clone(),
                "WILCO",
            )),
            _ => None,
        }
    }

    async fn accept(&self, message: &Message, force: bool) -> Status {
        if self.callsign.lock().await.is_none() {
            return Err(DatalinkError::NoConnection);
        }
        if !force && !self.stations.contains(&message.station) {
            return Err(DatalinkError::NoAtc);
        }

        self.outbox.lock().await.push(message.clone());
        if let Some(reply) = self.answer(message) {
            debug!("{} answers {:?} request", message.station, message.kind);
            self.mailbox.lock().await.push(reply);
        }
        Ok(())
    }
}

#[async_trait]
impl AtcNetwork for SimAtcNetwork {
    async fn connect(&self, callsign: &str) -> Status {
        let mut current = self.callsign.lock().await;
        if current.as_deref() == Some(callsign) {
            return Err(DatalinkError::CallsignInUse);
        }
        *current = Some(callsign.to_string());
        info!("ATC network logon as {}", callsign);
        Ok(())
    }

    async fn disconnect(&self) -> Status {
        match self.callsign.lock().await.take() {
            Some(_) => Ok(()),
            None => Err(DatalinkError::NoConnection),
        }
    }

    async fn poll(&self) -> Result<Vec<Message>, DatalinkError> {
        if self.callsign.lock().await.is_none() {
            return Err(DatalinkError::NoConnection);
        }
        Ok(self.mailbox.lock().await.drain(..).collect())
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn send_telex_message(&self, message: &Message, force: bool) -> Status {
        self.accept(message, force).await
    }

    async fn send_cpdlc_message(&self, message: &Message, force: bool) -> Status {
        self.accept(message, force).await
    }

    async fn is_station_available(&self, callsign: &str) -> Status {
        if self.callsign.lock().await.is_none() {
            return Err(DatalinkError::NoConnection);
        }
        if self.stations.contains(callsign) {
            Ok(())
        } else {
            Err(DatalinkError::NoAtc)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StationWeather {
    pub metar: String,
    pub taf: String,
    pub atis: String,
}

/// Company network backed by a fixed weather table.
pub struct SimCompanyNetwork {
    enabled: bool,
    poll_interval: Duration,
    weather: HashMap<String, StationWeather>,
    connected: Mutex<bool>,
    uplinks: Mutex<Vec<Message>>,
    outbox: Mutex<Vec<Message>>,
}

impl SimCompanyNetwork {
    pub fn new(enabled: bool, poll_interval: Duration) -> Self {
        Self {
            enabled,
            poll_interval,
            weather: HashMap::new(),
            connected: Mutex::new(false),
            uplinks: Mutex::new(Vec::new()),
            outbox: Mutex::new(Vec::new()),
        }
    }

    pub fn with_station(mut self, icao: &str, weather: StationWeather) -> Self {
        self.weather.insert(icao.to_string(), weather);
        self
    }

    pub async fn post(&self, message: Message) {
        self.uplinks.lock().await.push(message);
    }

    pub async fn sent(&self) -> Vec<Message> {
        self.outbox.lock().await.clone()
    }

    async fn check(&self) -> Status {
        if !self.enabled {
            return Err(DatalinkError::FeatureDisabled);
        }
        if !*self.connected.lock().await {
            return Err(DatalinkError::NoConnection);
        }
        Ok(())
    }

    async fn lookup<F>(&self, icao: &str, message: &mut WeatherMessage, field: F) -> Status
    where
        F: Fn(&StationWeather) -> &str + Send,
    {
        self.check().await?;
        match self.weather.get(icao) {
            Some(weather) => {
                message.push_report(icao, field(weather));
                Ok(())
            }
            None => Err(DatalinkError::Backend(format!("no data for {}", icao))),
        }
    }
}

#[async_trait]
impl CompanyNetwork for SimCompanyNetwork {
    async fn connect(&self, flight_number: &str) -> Status {
        if !self.enabled {
            return Err(DatalinkError::FeatureDisabled);
        }
        *self.connected.lock().await = true;
        info!("Company network logon as {}", flight_number);
        Ok(())
    }

    async fn disconnect(&self) -> Status {
        self.check().await?;
        *self.connected.lock().await = false;
        Ok(())
    }

    async fn poll(&self) -> Result<Vec<Message>, DatalinkError> {
        self.check().await?;
        Ok(self.uplinks.lock().await.drain(..).collect())
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn send_telex_message(&self, message: &Message) -> Status {
        self.check().await?;
        self.outbox.lock().await.push(message.clone());
        Ok(())
    }

    async fn receive_metar(&self, icao: &str, message: &mut WeatherMessage) -> Status {
        self.lookup(icao, message, |w| w.metar.as_str()).await
    }

    async fn receive_taf(&self, icao: &str, message: &mut WeatherMessage) -> Status {
        self.lookup(icao, message, |w| w.taf.as_str()).await
    }

    async fn receive_atis(&self, icao: &str, _kind: AtisType, message: &mut WeatherMessage) -> Status {
        self.lookup(icao, message, |w| w.atis.as_str()).await
    }
}

pub struct SimAircraft {
    powered: AtomicBool,
    phase: StdMutex<Option<FlightPhase>>,
}

impl SimAircraft {
    pub fn new() -> Self {
        Self {
            powered: AtomicBool::new(true),
            phase: StdMutex::new(Some(FlightPhase::Preflight)),
        }
    }

    pub fn set_powered(&self, powered: bool) {
        self.powered.store(powered, Ordering::SeqCst);
    }

    pub fn set_phase(&self, phase: FlightPhase) {
        if let Ok(mut current) = self.phase.lock() {
            *current = Some(phase);
        }
    }
}

impl Default for SimAircraft {
    fn default() -> Self {
        Self::new()
    }
}

impl Aircraft for SimAircraft {
    fn vhf_datalink_powered(&self) -> bool {
        self.powered.load(Ordering::SeqCst)
    }

    fn current_flight_phase(&self) -> Option<FlightPhase> {
        self.phase.lock().ok().and_then(|phase| *phase)
    }
}

/// Collects delivered uplinks for the scenario report.
#[derive(Default)]
pub struct RecordingRegistry {
    received: StdMutex<Vec<Message>>,
}

impl RecordingRegistry {
    pub fn received(&self) -> Vec<Message> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl MessageRegistry for RecordingRegistry {
    fn register_messages(&self, messages: Vec<Message>) {
        for message in &messages {
            info!("Uplink from {}: {}", message.station, message.body);
        }
        if let Ok(mut received) = self.received.lock() {
            received.extend(messages);
        }
    }
}
