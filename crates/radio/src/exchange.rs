//! Request/response exchange over the simulated link
//!
//! A data request (weather, ATIS) does not put an aircraft message on the
//! air, but the reply must still arrive with the latency real traffic would
//! see. An [`Exchange`] walks through the stages of such a round trip:
//!
//! `QueuedOutbound` -> `Sent` -> `Processing` -> `QueuedInbound` -> `Delivered`
//!
//! Each call to [`Exchange::step`] completes exactly one stage. Air time is
//! waited out on the link's own tasks, so a queued transmission is released
//! even when the exchange is dropped mid-stage.

use std::mem;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};
use serde::Serialize;
use tokio::time::sleep;

use crate::vdl::{Transmission, Vdl};

#[derive(Debug)]
pub enum ExchangeState {
    /// Request packet waiting for air time.
    QueuedOutbound(Transmission),
    /// Request has left the aircraft.
    Sent,
    /// Ground side is preparing the reply.
    Processing,
    /// Reply crossing the link.
    QueuedInbound(Transmission),
    Delivered,
}

pub struct Exchange<T, F> {
    vdl: Arc<Vdl>,
    reply: T,
    processing_delay: Duration,
    on_sent: Option<F>,
    state: ExchangeState,
}

impl<T, F> Exchange<T, F>
where
    T: Serialize + Send + Sync,
    F: FnOnce() + Send,
{
    /// Queues the request packet. `on_sent` runs once the request has left
    /// the aircraft, before the ground side starts processing.
    pub async fn start(vdl: &Arc<Vdl>, reply: T, processing_delay: Duration, on_sent: F) -> Self {
        let request = vdl.enqueue_outbound_packet().await;
        debug!(
            "Data request queued, {:?} until sent, {:?} processing",
            request.delay(),
            processing_delay
        );

        Self {
            vdl: Arc::clone(vdl),
            reply,
            processing_delay,
            on_sent: Some(on_sent),
            state: ExchangeState::QueuedOutbound(request),
        }
    }

    pub fn state(&self) -> &ExchangeState {
        &self.state
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.state, ExchangeState::Delivered)
    }

    /// Completes the current stage and moves to the next one.
    pub async fn step(&mut self) {
        self.state = match mem::replace(&mut self.state, ExchangeState::Delivered) {
            ExchangeState::QueuedOutbound(request) => {
                self.vdl.complete_outbound(request).await;
                ExchangeState::Sent
            }
            ExchangeState::Sent => {
                if let Some(on_sent) = self.on_sent.take() {
                    on_sent();
                }
                ExchangeState::Processing
            }
            ExchangeState::Processing => {
                sleep(self.processing_delay).await;
                let response = self.vdl.enqueue_inbound_message(&self.reply).await;
                trace!("Reply queued, {:?} until received", response.delay());
                ExchangeState::QueuedInbound(response)
            }
            ExchangeState::QueuedInbound(response) => {
                self.vdl.complete_inbound(response).await;
                ExchangeState::Delivered
            }
            ExchangeState::Delivered => ExchangeState::Delivered,
        };
    }

    /// Drives the exchange to completion and hands out the reply.
    pub async fn run(mut self) -> T {
        while !self.is_delivered() {
            self.step().await;
        }
        self.reply
    }
}
