//! scripted VHF datalink session

use anyhow::Result;
use colored::Colorize;
use vhf_datalink_sim::{scenarios, SimulationPresets};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    println!("{}", "VHF Datalink Simulation".bright_blue().bold());
    println!("{}", "=======================".bright_blue());
    println!();

    let channels = vec![
        ("Quiet Channel", SimulationPresets::quiet_channel()),
        ("Average Channel", SimulationPresets::average_channel()),
        ("Congested Channel", SimulationPresets::congested_channel()),
    ];

    for (name, link) in channels {
        println!("{}", format!("\n>>> Testing: {}", name).bright_green().bold());
        println!("Bit rate: {} bps", link.bitrate_bps);
        println!("Aircraft at airport: {:?}", link.airport_users);
        println!("Aircraft en route: {:?}", link.enroute_users);
        println!("Jitter: {:?}", link.latency_jitter);

        let config = SimulationPresets::fast_forward(link);
        scenarios::departure_scenario(config.clone()).await;
        scenarios::congestion_test(config, 8).await;

        println!("{}", "Test complete!".bright_yellow());
        println!("{}", "-".repeat(50));
    }

    println!("\n{}", "All simulations complete!".bright_green().bold());
    Ok(())
}
