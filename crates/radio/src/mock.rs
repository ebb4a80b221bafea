//! Recording collaborators for tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use vhf_datalink_core::{
    AtisType, DatalinkError, FlightPhase, Message, Status, WeatherMessage,
};

use crate::connector::{Aircraft, AtcNetwork, CompanyNetwork, MessageRegistry};
use crate::datalink::Datalink;
use crate::{DatalinkConfig, LinkConfig};

type PollResult = Result<Vec<Message>, DatalinkError>;

pub struct MockAtc {
    pub connect_status: Mutex<Status>,
    pub disconnect_status: Mutex<Status>,
    pub poll_interval: Duration,
    /// Poll answers, each returned after its delay.
    pub polls: Mutex<VecDeque<(Duration, PollResult)>>,
    pub calls: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<(Message, bool)>>,
}

impl MockAtc {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            connect_status: Mutex::new(Ok(())),
            disconnect_status: Mutex::new(Ok(())),
            poll_interval,
            polls: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn push_poll(&self, result: PollResult) {
        self.push_slow_poll(Duration::ZERO, result);
    }

    pub fn push_slow_poll(&self, delay: Duration, result: PollResult) {
        self.polls.lock().unwrap().push_back((delay, result));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

#[async_trait]
impl AtcNetwork for MockAtc {
    async fn connect(&self, _callsign: &str) -> Status {
        self.record("connect");
        self.connect_status.lock().unwrap().clone()
    }

    async fn disconnect(&self) -> Status {
        self.record("disconnect");
        self.disconnect_status.lock().unwrap().clone()
    }

    async fn poll(&self) -> Result<Vec<Message>, DatalinkError> {
        self.record("poll");
        let next = self.polls.lock().unwrap().pop_front();
        let (delay, result) = next.unwrap_or((Duration::ZERO, Ok(Vec::new())));
        if !delay.is_zero() {
            sleep(delay).await;
        }
        result
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn send_telex_message(&self, message: &Message, force: bool) -> Status {
        self.record("telex");
        self.sent.lock().unwrap().push((message.clone(), force));
        Ok(())
    }

    async fn send_cpdlc_message(&self, message: &Message, force: bool) -> Status {
        self.record("cpdlc");
        self.sent.lock().unwrap().push((message.clone(), force));
        Ok(())
    }

    async fn is_station_available(&self, callsign: &str) -> Status {
        self.record("station");
        if callsign == "EDDF" {
            Ok(())
        } else {
            Err(DatalinkError::NoAtc)
        }
    }
}

pub struct MockCompany {
    pub connect_status: Mutex<Status>,
    pub disconnect_status: Mutex<Status>,
    pub poll_interval: Duration,
    pub polls: Mutex<VecDeque<PollResult>>,
    /// Stations whose weather fetch fails with the given error.
    pub failing: Mutex<HashMap<String, DatalinkError>>,
    pub calls: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<Message>>,
}

impl MockCompany {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            connect_status: Mutex::new(Ok(())),
            disconnect_status: Mutex::new(Ok(())),
            poll_interval,
            polls: Mutex::new(VecDeque::new()),
            failing: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn push_poll(&self, result: PollResult) {
        self.polls.lock().unwrap().push_back(result);
    }

    pub fn fail_station(&self, icao: &str, error: DatalinkError) {
        self.failing.lock().unwrap().insert(icao.to_string(), error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn fetch(&self, call: &str, icao: &str, message: &mut WeatherMessage) -> Status {
        self.record(&format!("{} {}", call, icao));
        if let Some(error) = self.failing.lock().unwrap().get(icao) {
            return Err(error.clone());
        }
        message.push_report(icao, format!("{} {} REPORT", call.to_uppercase(), icao));
        Ok(())
    }
}

#[async_trait]
impl CompanyNetwork for MockCompany {
    async fn connect(&self, _flight_number: &str) -> Status {
        self.record("connect");
        self.connect_status.lock().unwrap().clone()
    }

    async fn disconnect(&self) -> Status {
        self.record("disconnect");
        self.disconnect_status.lock().unwrap().clone()
    }

    async fn poll(&self) -> Result<Vec<Message>, DatalinkError> {
        self.record("poll");
        self.polls.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn send_telex_message(&self, message: &Message) -> Status {
        self.record("telex");
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn receive_metar(&self, icao: &str, message: &mut WeatherMessage) -> Status {
        self.fetch("metar", icao, message)
    }

    async fn receive_taf(&self, icao: &str, message: &mut WeatherMessage) -> Status {
        self.fetch("taf", icao, message)
    }

    async fn receive_atis(&self, icao: &str, _kind: AtisType, message: &mut WeatherMessage) -> Status {
        self.fetch("atis", icao, message)
    }
}

pub struct MockAircraft {
    pub powered: AtomicBool,
    pub phase: Mutex<Option<FlightPhase>>,
}

impl MockAircraft {
    pub fn set_powered(&self, powered: bool) {
        self.powered.store(powered, Ordering::SeqCst);
    }

    pub fn set_phase(&self, phase: Option<FlightPhase>) {
        *self.phase.lock().unwrap() = phase;
    }
}

impl Aircraft for MockAircraft {
    fn vhf_datalink_powered(&self) -> bool {
        self.powered.load(Ordering::SeqCst)
    }

    fn current_flight_phase(&self) -> Option<FlightPhase> {
        *self.phase.lock().unwrap()
    }
}

#[derive(Default)]
pub struct MockRegistry {
    pub batches: Mutex<Vec<Vec<Message>>>,
}

impl MockRegistry {
    pub fn messages(&self) -> Vec<Message> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }
}

impl MessageRegistry for MockRegistry {
    fn register_messages(&self, messages: Vec<Message>) {
        self.batches.lock().unwrap().push(messages);
    }
}

pub struct Harness {
    pub atc: Arc<MockAtc>,
    pub company: Arc<MockCompany>,
    pub aircraft: Arc<MockAircraft>,
    pub registry: Arc<MockRegistry>,
    pub datalink: Arc<Datalink>,
}

/// Timing without jitter, 50 aircraft on the channel in every phase.
pub fn test_config() -> DatalinkConfig {
    DatalinkConfig {
        link: LinkConfig {
            latency_jitter: Duration::ZERO,
            airport_users: 50..=50,
            terminal_users: 50..=50,
            enroute_users: 50..=50,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn harness() -> Harness {
    harness_with(
        test_config(),
        Duration::from_millis(10_000),
        Duration::from_millis(15_000),
    )
}

pub fn harness_with(
    config: DatalinkConfig,
    atc_interval: Duration,
    company_interval: Duration,
) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();

    let atc = Arc::new(MockAtc::new(atc_interval));
    let company = Arc::new(MockCompany::new(company_interval));
    let aircraft = Arc::new(MockAircraft {
        powered: AtomicBool::new(true),
        phase: Mutex::new(Some(FlightPhase::Preflight)),
    });
    let registry = Arc::new(MockRegistry::default());

    let datalink = Datalink::new(
        config,
        aircraft.clone(),
        registry.clone(),
        atc.clone(),
        company.clone(),
    );

    Harness {
        atc,
        company,
        aircraft,
        registry,
        datalink,
    }
}
