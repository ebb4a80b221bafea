//! VHF Data Link mode 2 channel model
//!
//! The channel is a shared medium: its usable bit rate is split between every
//! aircraft in range, so the time a frame occupies the air depends on the
//! flight phase. Outbound and inbound traffic are queued separately, and each
//! new transmission waits behind the bytes already queued in its direction.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::sleep;
use vhf_datalink_core::FlightPhase;

use crate::LinkConfig;

/// Payload of a data request; it still occupies a whole frame on air.
const REQUEST_FRAME_SIZE: usize = 32;

pub type TransmissionId = u64;

/// A transmission that occupies the link until it is dequeued.
///
/// Handles are neither `Clone` nor `Copy`: the matching dequeue consumes the
/// handle, so each transmission leaves the queue at most once.
#[derive(Debug)]
#[must_use = "a transmission must be dequeued once its delay has elapsed"]
pub struct Transmission {
    id: TransmissionId,
    delay: Duration,
}

impl Transmission {
    pub fn id(&self) -> TransmissionId {
        self.id
    }

    /// Time until the transmission has fully crossed the link.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Link quality derived from the flight phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkCondition {
    pub phase: FlightPhase,
    /// Aircraft sharing the channel.
    pub users: u32,
    /// Bit rate left for this aircraft.
    pub effective_bps: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub outbound_completed: u64,
    pub inbound_completed: u64,
    pub outbound_queued: usize,
    pub inbound_queued: usize,
    /// Bytes waiting for air time, outbound.
    pub outbound_bytes: usize,
    /// Bytes waiting for air time, inbound.
    pub inbound_bytes: usize,
    pub users: u32,
}

#[derive(Debug, Default)]
struct TrafficQueue {
    pending: HashMap<TransmissionId, usize>,
    bytes: usize,
    completed: u64,
}

impl TrafficQueue {
    fn push(&mut self, id: TransmissionId, bytes: usize) {
        self.pending.insert(id, bytes);
        self.bytes += bytes;
    }

    fn remove(&mut self, id: TransmissionId) -> bool {
        match self.pending.remove(&id) {
            Some(bytes) => {
                self.bytes -= bytes;
                self.completed += 1;
                true
            }
            None => false,
        }
    }
}

struct LinkState {
    condition: LinkCondition,
    outbound: TrafficQueue,
    inbound: TrafficQueue,
    next_id: TransmissionId,
}

impl LinkState {
    fn next_id(&mut self) -> TransmissionId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

pub struct Vdl {
    config: LinkConfig,
    state: Mutex<LinkState>,
}

impl Vdl {
    pub fn new(config: LinkConfig) -> Self {
        let condition = condition_for(&config, FlightPhase::Preflight);
        info!(
            "VDL initialized with {} users on channel ({:.0} bps effective)",
            condition.users, condition.effective_bps
        );

        Self {
            config,
            state: Mutex::new(LinkState {
                condition,
                outbound: TrafficQueue::default(),
                inbound: TrafficQueue::default(),
                next_id: 0,
            }),
        }
    }

    /// Recomputes the link condition for `phase`.
    ///
    /// Transmissions already in flight keep their delay.
    pub async fn simulate_transmission_times(&self, phase: FlightPhase) {
        let condition = condition_for(&self.config, phase);
        let mut state = self.state.lock().await;
        debug!(
            "Link condition for {:?}: {} users, {:.0} bps effective",
            phase, condition.users, condition.effective_bps
        );
        state.condition = condition;
    }

    pub async fn condition(&self) -> LinkCondition {
        self.state.lock().await.condition
    }

    /// Queues a full downlink message.
    pub async fn enqueue_outbound_message<T: Serialize>(&self, message: &T) -> Transmission {
        let bytes = self.frame_bytes(encoded_len(message));
        let mut state = self.state.lock().await;
        let delay = self.delay(&state.condition, state.outbound.bytes + bytes);
        let id = state.next_id();
        state.outbound.push(id, bytes);
        trace!("Outbound message {} queued: {} bytes, {:?}", id, bytes, delay);
        Transmission { id, delay }
    }

    /// Queues a data request packet without payload.
    pub async fn enqueue_outbound_packet(&self) -> Transmission {
        let bytes = self.frame_bytes(REQUEST_FRAME_SIZE);
        let mut state = self.state.lock().await;
        let delay = self.delay(&state.condition, state.outbound.bytes + bytes);
        let id = state.next_id();
        state.outbound.push(id, bytes);
        trace!("Outbound request packet {} queued, {:?}", id, delay);
        Transmission { id, delay }
    }

    pub async fn dequeue_outbound_message(&self, transmission: Transmission) {
        let mut state = self.state.lock().await;
        if !state.outbound.remove(transmission.id) {
            warn!("Outbound transmission {} was not queued", transmission.id);
        }
    }

    /// Queues an uplink message behind the uplinks already on the channel.
    pub async fn enqueue_inbound_message<T: Serialize>(&self, message: &T) -> Transmission {
        let bytes = self.frame_bytes(encoded_len(message));
        let mut state = self.state.lock().await;
        let delay = self.delay(&state.condition, state.inbound.bytes + bytes);
        let id = state.next_id();
        state.inbound.push(id, bytes);
        trace!("Inbound message {} queued: {} bytes, {:?}", id, bytes, delay);
        Transmission { id, delay }
    }

    pub async fn dequeue_inbound_message(&self, transmission: Transmission) {
        let mut state = self.state.lock().await;
        if !state.inbound.remove(transmission.id) {
            warn!("Inbound transmission {} was not queued", transmission.id);
        }
    }

    /// Waits out the delay of an outbound transmission and dequeues it.
    ///
    /// The wait runs on its own task, so the transmission leaves the queue
    /// even if the caller stops waiting.
    pub async fn complete_outbound(self: &Arc<Self>, transmission: Transmission) {
        let vdl = Arc::clone(self);
        let handle = tokio::spawn(async move {
            sleep(transmission.delay()).await;
            vdl.dequeue_outbound_message(transmission).await;
        });
        if let Err(e) = handle.await {
            warn!("Outbound completion task failed: {}", e);
        }
    }

    /// Inbound counterpart of [`Vdl::complete_outbound`].
    pub async fn complete_inbound(self: &Arc<Self>, transmission: Transmission) {
        let vdl = Arc::clone(self);
        let handle = tokio::spawn(async move {
            sleep(transmission.delay()).await;
            vdl.dequeue_inbound_message(transmission).await;
        });
        if let Err(e) = handle.await {
            warn!("Inbound completion task failed: {}", e);
        }
    }

    pub async fn stats(&self) -> LinkStats {
        let state = self.state.lock().await;
        LinkStats {
            outbound_completed: state.outbound.completed,
            inbound_completed: state.inbound.completed,
            outbound_queued: state.outbound.pending.len(),
            inbound_queued: state.inbound.pending.len(),
            outbound_bytes: state.outbound.bytes,
            inbound_bytes: state.inbound.bytes,
            users: state.condition.users,
        }
    }

    /// Rounds a payload up to whole frames.
    fn frame_bytes(&self, payload: usize) -> usize {
        let packet_size = self.config.packet_size.max(1);
        payload.div_ceil(packet_size).max(1) * packet_size
    }

    fn delay(&self, condition: &LinkCondition, bytes_on_air: usize) -> Duration {
        let air_time = Duration::from_secs_f64((bytes_on_air * 8) as f64 / condition.effective_bps);
        self.config.propagation_delay + air_time + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let sigma = self.config.latency_jitter.as_secs_f64();
        if sigma <= 0.0 {
            return Duration::ZERO;
        }
        match Normal::new(0.0, sigma) {
            Ok(normal) => Duration::from_secs_f64(normal.sample(&mut rand::rng()).abs()),
            Err(_) => Duration::ZERO,
        }
    }
}

fn users_for(config: &LinkConfig, phase: FlightPhase) -> &RangeInclusive<u32> {
    if phase.is_airport() {
        &config.airport_users
    } else if phase.is_terminal() {
        &config.terminal_users
    } else {
        &config.enroute_users
    }
}

fn condition_for(config: &LinkConfig, phase: FlightPhase) -> LinkCondition {
    let range = users_for(config, phase);
    let users = if range.is_empty() {
        1
    } else {
        rand::rng().random_range(range.clone()).max(1)
    };

    LinkCondition {
        phase,
        users,
        effective_bps: f64::from(config.bitrate_bps.max(1)) / f64::from(users),
    }
}

fn encoded_len<T: Serialize>(value: &T) -> usize {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map(|v| v.len())
        .unwrap_or(0)
}
