//! Datalink orchestrator
//!
//! Sits between the avionics application and the two backend networks. Every
//! message that crosses the link is delayed by the [`Vdl`] channel model, and
//! downlinks are routed to the network that serves their category. A periodic
//! tick keeps the link condition in line with the flight phase and polls both
//! networks for uplinks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};
use rand::Rng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use vhf_datalink_core::{
    AtisType, DatalinkError, Message, Status, WeatherKind, WeatherMessage,
};

use crate::connector::{Aircraft, AtcNetwork, CompanyNetwork, MessageRegistry};
use crate::exchange::Exchange;
use crate::routing::{route, Route};
use crate::scheduler::PollScheduler;
use crate::vdl::{LinkStats, Vdl};
use crate::DatalinkConfig;

/// Reply to a weather or ATIS request.
///
/// `status` is the outcome of the last fetch; the message holds every report
/// that could be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReply {
    pub status: Status,
    pub message: WeatherMessage,
}

pub struct Datalink {
    config: DatalinkConfig,
    vdl: Arc<Vdl>,
    aircraft: Arc<dyn Aircraft>,
    registry: Arc<dyn MessageRegistry>,
    atc: Arc<dyn AtcNetwork>,
    company: Arc<dyn CompanyNetwork>,
    scheduler: Mutex<PollScheduler>,
    first_atc_poll: AtomicBool,
    atc_poll_in_flight: AtomicBool,
}

impl Datalink {
    pub fn new(
        config: DatalinkConfig,
        aircraft: Arc<dyn Aircraft>,
        registry: Arc<dyn MessageRegistry>,
        atc: Arc<dyn AtcNetwork>,
        company: Arc<dyn CompanyNetwork>,
    ) -> Arc<Self> {
        let vdl = Arc::new(Vdl::new(config.link.clone()));
        let scheduler = PollScheduler::new(config.tick, config.link_refresh_interval);
        info!(
            "Datalink initialized: tick {:?}, link refresh every {:?}",
            config.tick, config.link_refresh_interval
        );

        Arc::new(Self {
            config,
            vdl,
            aircraft,
            registry,
            atc,
            company,
            scheduler: Mutex::new(scheduler),
            first_atc_poll: AtomicBool::new(true),
            atc_poll_in_flight: AtomicBool::new(false),
        })
    }

    /// Spawns the periodic tick. Abort the returned handle to stop polling.
    pub fn start_polling(self: &Arc<Self>) -> JoinHandle<()> {
        let datalink = Arc::clone(self);
        tokio::spawn(async move {
            let period = datalink.scheduler.lock().await.tick_period();
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                datalink.tick().await;
            }
        })
    }

    /// Runs one scheduler tick. Polls are spawned and never block the tick.
    pub async fn tick(self: &Arc<Self>) {
        let due = {
            let mut scheduler = self.scheduler.lock().await;
            scheduler.tick(self.atc.poll_interval(), self.company.poll_interval())
        };

        if due.refresh_link {
            let phase = self.aircraft.current_flight_phase().unwrap_or_else(|| {
                debug!("No valid flight phase, assuming preflight");
                Default::default()
            });
            self.vdl.simulate_transmission_times(phase).await;
        }

        // one ATC poll at a time, so the first poll issued is the first to finish
        if due.poll_atc {
            if self.atc_poll_in_flight.swap(true, Ordering::SeqCst) {
                debug!("ATC poll still running, skipping this one");
            } else {
                tokio::spawn(Arc::clone(self).poll_atc());
            }
        }

        if due.poll_company {
            tokio::spawn(Arc::clone(self).poll_company());
        }
    }

    async fn poll_atc(self: Arc<Self>) {
        match self.atc.poll().await {
            Ok(messages) => {
                // the ATC mailbox replays old traffic on first contact
                if self.first_atc_poll.swap(false, Ordering::SeqCst) {
                    if !messages.is_empty() {
                        info!("Discarding {} stored ATC messages from first poll", messages.len());
                    }
                } else {
                    self.enqueue_received_messages(messages).await;
                }
            }
            Err(e) => warn!("ATC network poll failed: {}", e),
        }
        self.atc_poll_in_flight.store(false, Ordering::SeqCst);
    }

    async fn poll_company(self: Arc<Self>) {
        match self.company.poll().await {
            Ok(messages) => self.enqueue_received_messages(messages).await,
            Err(e) => warn!("Company network poll failed: {}", e),
        }
    }

    /// Puts polled uplinks on the link and delivers each once it has arrived.
    async fn enqueue_received_messages(self: &Arc<Self>, messages: Vec<Message>) {
        if !self.aircraft.vhf_datalink_powered() {
            if !messages.is_empty() {
                debug!("VHF datalink unpowered, rejecting {} uplinks", messages.len());
            }
            return;
        }

        for message in messages {
            if message.is_empty() {
                warn!("Dropping empty uplink from {}", message.station);
                continue;
            }

            let transmission = self.vdl.enqueue_inbound_message(&message).await;
            debug!(
                "Uplink from {} arrives in {:?}",
                message.station,
                transmission.delay()
            );
            let datalink = Arc::clone(self);
            tokio::spawn(async move {
                sleep(transmission.delay()).await;
                datalink.vdl.dequeue_inbound_message(transmission).await;
                datalink.registry.register_messages(vec![message]);
            });
        }
    }

    pub async fn connect(&self, flight_number: &str) -> Status {
        match self.company.connect(flight_number).await {
            Ok(()) | Err(DatalinkError::FeatureDisabled) => {}
            Err(e) => {
                warn!("Company network connect failed: {}", e);
                return Err(e);
            }
        }

        let status = match self.atc.connect(flight_number).await {
            Err(DatalinkError::NoConnection) => Ok(()),
            other => other,
        };
        if status.is_ok() {
            info!("Datalink connected as {}", flight_number);
        }
        status
    }

    /// Disconnects both networks, reporting the company network's failure first.
    pub async fn disconnect(&self) -> Status {
        let company = match self.company.disconnect().await {
            Err(DatalinkError::FeatureDisabled) => Ok(()),
            other => other,
        };
        let atc = match self.atc.disconnect().await {
            Err(DatalinkError::NoConnection) => Ok(()),
            other => other,
        };
        let status = company.and(atc);
        if status.is_ok() {
            info!("Datalink disconnected");
        }
        status
    }

    /// Transmits `message` and hands it to the network that serves it.
    ///
    /// `force` is passed to the ATC network unchanged.
    pub async fn send_message(&self, message: &Message, force: bool) -> Status {
        if !self.aircraft.vhf_datalink_powered() {
            return Err(DatalinkError::ComFailed);
        }

        let transmission = self.vdl.enqueue_outbound_message(message).await;
        self.vdl.complete_outbound(transmission).await;

        // the air time is spent even if the message cannot be routed
        let selected = route(message)?;
        debug!("Routing {:?} to {} via {:?}", message.kind, message.station, selected);
        match selected {
            Route::CompanyTelex => self.company.send_telex_message(message).await,
            Route::AtcTelex => self.atc.send_telex_message(message, force).await,
            Route::AtcCpdlc => self.atc.send_cpdlc_message(message, force).await,
        }
    }

    /// Requests METARs (or TAFs) for every airport in `icaos`.
    ///
    /// Every airport is fetched even if an earlier fetch fails.
    pub async fn receive_weather<F>(
        &self,
        request_metar: bool,
        icaos: &[&str],
        on_sent: F,
    ) -> Result<WeatherReply, DatalinkError>
    where
        F: FnOnce() + Send,
    {
        if !self.aircraft.vhf_datalink_powered() {
            return Err(DatalinkError::ComFailed);
        }

        let kind = if request_metar { WeatherKind::Metar } else { WeatherKind::Taf };
        let mut message = WeatherMessage::new(kind);
        let mut status = Ok(());
        for icao in icaos {
            status = if request_metar {
                self.company.receive_metar(icao, &mut message).await
            } else {
                self.company.receive_taf(icao, &mut message).await
            };
            if let Err(e) = &status {
                warn!("{:?} request for {} failed: {}", kind, icao, e);
            }
        }

        Ok(self.simulate_request_response(status, message, on_sent).await)
    }

    pub async fn receive_atis<F>(
        &self,
        icao: &str,
        kind: AtisType,
        on_sent: F,
    ) -> Result<WeatherReply, DatalinkError>
    where
        F: FnOnce() + Send,
    {
        if !self.aircraft.vhf_datalink_powered() {
            return Err(DatalinkError::ComFailed);
        }

        let mut message = WeatherMessage::new(WeatherKind::Atis(kind));
        let status = self.company.receive_atis(icao, kind, &mut message).await;
        if let Err(e) = &status {
            warn!("ATIS request for {} failed: {}", icao, e);
        }

        Ok(self.simulate_request_response(status, message, on_sent).await)
    }

    pub async fn is_station_available(&self, callsign: &str) -> Status {
        if !self.aircraft.vhf_datalink_powered() {
            return Err(DatalinkError::ComFailed);
        }
        self.atc.is_station_available(callsign).await
    }

    pub async fn link_stats(&self) -> LinkStats {
        self.vdl.stats().await
    }

    async fn simulate_request_response<F>(
        &self,
        status: Status,
        message: WeatherMessage,
        on_sent: F,
    ) -> WeatherReply
    where
        F: FnOnce() + Send,
    {
        if message.is_empty() {
            debug!("{:?} reply carries no reports", message.kind);
        }
        let exchange = Exchange::start(&self.vdl, message, self.processing_delay(), on_sent).await;
        let message = exchange.run().await;
        trace!("{:?} reply delivered with {} reports", message.kind, message.reports.len());
        WeatherReply { status, message }
    }

    fn processing_delay(&self) -> Duration {
        let min = self.config.processing_delay_min;
        let max = self.config.processing_delay_max;
        if min >= max {
            return min;
        }
        rand::rng().random_range(min..max)
    }
}
