//! Scripted datalink sessions

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tokio::time::{sleep, Instant};
use vhf_datalink_core::{
    AtisType, Direction, FlightPhase, Message, MessageType, Network,
};
use vhf_datalink_radio::{Datalink, DatalinkConfig};

use crate::backends::{RecordingRegistry, SimAircraft, SimAtcNetwork, SimCompanyNetwork, StationWeather};

pub struct Session {
    pub datalink: Arc<Datalink>,
    pub aircraft: Arc<SimAircraft>,
    pub atc: Arc<SimAtcNetwork>,
    pub company: Arc<SimCompanyNetwork>,
    pub registry: Arc<RecordingRegistry>,
}

/// Wires a datalink to the in-memory networks, with weather for EDDF and EGLL.
pub fn session(config: DatalinkConfig) -> Session {
    let poll = config.tick * 2;
    let aircraft = Arc::new(SimAircraft::new());
    let registry = Arc::new(RecordingRegistry::default());
    let atc = Arc::new(SimAtcNetwork::new(poll, &["EDDF", "EGLL", "EDYY"]));
    let company = Arc::new(
        SimCompanyNetwork::new(true, poll * 2)
            .with_station(
                "EDDF",
                StationWeather {
                    metar: "EDDF 181020Z 24008KT CAVOK 14/06 Q1021 NOSIG".into(),
                    taf: "TAF EDDF 180500Z 1806/1912 24010KT CAVOK".into(),
                    atis: "FRANKFURT INFORMATION K RWY 25C 24008KT CAVOK QNH 1021".into(),
                },
            )
            .with_station(
                "EGLL",
                StationWeather {
                    metar: "EGLL 181020Z 22012KT 9999 SCT035 15/09 Q1014".into(),
                    taf: "TAF EGLL 180459Z 1806/1912 22012KT 9999 SCT035".into(),
                    atis: "HEATHROW INFORMATION D RWY 27L 22012KT QNH 1014".into(),
                },
            ),
    );
    let datalink = Datalink::new(
        config,
        aircraft.clone(),
        registry.clone(),
        atc.clone(),
        company.clone(),
    );

    Session {
        datalink,
        aircraft,
        atc,
        company,
        registry,
    }
}

/// Logon, weather, clearance and an en-route telex.
pub async fn departure_scenario(config: DatalinkConfig) {
    println!("\n=== Departure Scenario ===");
    let poll_wait = config.tick * 12;
    let s = session(config);

    // an old clearance sits in the ATC mailbox from a previous session
    s.atc
        .post(Message::new(
            MessageType::Dcl,
            Network::Atc,
            Direction::Uplink,
            "EDDF",
            "CLEARED TO KJFK VIA OBOKA1G",
        ))
        .await;

    let polling = s.datalink.start_polling();

    match s.datalink.connect("DLH4U").await {
        Ok(()) => println!("✓ Connected as DLH4U"),
        Err(e) => println!("✗ Connect failed: {}", e),
    }

    // dispatch sends a gate change once the crew is logged on
    s.company
        .post(Message::new(
            MessageType::Freetext,
            Network::Company,
            Direction::Uplink,
            "OPS",
            "GATE CHANGE B44",
        ))
        .await;

    println!("\nStep 1: METAR request");
    let start = Instant::now();
    let reply = s
        .datalink
        .receive_weather(true, &["EDDF", "EGLL"], move || {
            println!("  request sent after {:?}", start.elapsed());
        })
        .await;
    match reply {
        Ok(reply) => {
            println!("  reply after {:?} ({:?})", start.elapsed(), reply.status);
            for report in &reply.message.reports {
                println!("  {}", report.report.bright_white());
            }
        }
        Err(e) => println!("✗ METAR request failed: {}", e),
    }

    println!("\nStep 2: departure ATIS");
    let start = Instant::now();
    match s.datalink.receive_atis("EDDF", AtisType::Departure, || {}).await {
        Ok(reply) => println!("  {} ({:?})", reply.message.to_message().body, start.elapsed()),
        Err(e) => println!("✗ ATIS request failed: {}", e),
    }

    println!("\nStep 3: departure clearance");
    let available = s.datalink.is_station_available("EDDF").await;
    println!("  EDDF online: {}", available.is_ok());
    let dcl = Message::new(
        MessageType::Dcl,
        Network::Atc,
        Direction::Downlink,
        "EDDF",
        "REQUEST DEPARTURE CLEARANCE DLH4U A320 TO EGLL STAND V155 ATIS K",
    );
    let start = Instant::now();
    match s.datalink.send_message(&dcl, false).await {
        Ok(()) => println!("✓ Clearance request sent in {:?}", start.elapsed()),
        Err(e) => println!("✗ Clearance request failed: {}", e),
    }

    sleep(poll_wait).await;
    for message in s.registry.received() {
        println!("  {} {}", message.station.bright_green(), message.body);
    }

    println!("\nStep 4: en-route telex");
    s.aircraft.set_phase(FlightPhase::Cruise);
    sleep(poll_wait).await;
    let telex = Message::telex(Network::Company, "OPS", "ETA EGLL 1432 FOB 5.2");
    let start = Instant::now();
    match s.datalink.send_message(&telex, false).await {
        Ok(()) => println!("✓ Company telex sent in {:?}", start.elapsed()),
        Err(e) => println!("✗ Company telex failed: {}", e),
    }

    let stats = s.datalink.link_stats().await;
    println!(
        "\nLink: {} users, {} sent, {} received",
        stats.users, stats.outbound_completed, stats.inbound_completed
    );
    println!("Company outbox: {} messages", s.company.sent().await.len());

    match s.datalink.disconnect().await {
        Ok(()) => println!("✓ Disconnected"),
        Err(e) => println!("✗ Disconnect failed: {}", e),
    }
    polling.abort();
    println!("=== Departure Scenario Complete ===\n");
}

/// Sends a burst of telexes at once and reports how the queue spreads them.
pub async fn congestion_test(config: DatalinkConfig, burst: usize) {
    println!("\n=== Congestion Test ({} messages) ===", burst);
    let s = session(config);
    if let Err(e) = s.datalink.connect("DLH4U").await {
        println!("✗ Connect failed: {}", e);
        return;
    }

    let start = Instant::now();
    let mut handles = Vec::new();
    for i in 0..burst {
        let datalink = s.datalink.clone();
        handles.push(tokio::spawn(async move {
            let msg = Message::telex(Network::Company, "OPS", format!("POSITION REPORT {:02}", i));
            let status = datalink.send_message(&msg, false).await;
            (i, status, start.elapsed())
        }));
    }

    let mut latencies: Vec<Duration> = Vec::new();
    for handle in handles {
        match handle.await {
            Ok((i, Ok(()), elapsed)) => {
                println!("  message {:02} sent after {:?}", i, elapsed);
                latencies.push(elapsed);
            }
            Ok((i, Err(e), _)) => println!("  message {:02} failed: {}", i, e),
            Err(e) => println!("  task failed: {}", e),
        }
    }

    if let (Some(min), Some(max)) = (latencies.iter().min(), latencies.iter().max()) {
        println!("  fastest {:?}, slowest {:?}", min, max);
    }
    let stats = s.datalink.link_stats().await;
    println!("  queue drained: {}", stats.outbound_queued == 0);
    println!("=== Congestion Test Complete ===\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimulationPresets;

    #[tokio::test(start_paused = true)]
    async fn test_session_round_trip() {
        let s = session(SimulationPresets::fast_forward(SimulationPresets::quiet_channel()));
        assert!(s.datalink.connect("DLH4U").await.is_ok());

        let reply = s.datalink.receive_weather(false, &["EGLL"], || {}).await.unwrap();
        assert!(reply.status.is_ok());
        assert_eq!(reply.message.reports.len(), 1);

        let telex = Message::telex(Network::Company, "OPS", "BOARDING COMPLETE");
        assert!(s.datalink.send_message(&telex, false).await.is_ok());
        assert_eq!(s.company.sent().await, vec![telex]);

        let uplink = Message::new(MessageType::Freetext, Network::Company, Direction::Uplink, "OPS", "GATE CHANGE B44");
        s.company.post(uplink.clone()).await;
        let polling = s.datalink.start_polling();
        sleep(Duration::from_secs(5)).await;
        polling.abort();
        assert_eq!(s.registry.received(), vec![uplink]);

        assert!(s.datalink.disconnect().await.is_ok());
    }
}
