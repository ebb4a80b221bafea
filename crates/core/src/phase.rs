use serde::{Deserialize, Serialize};

/// Flight phase as reported by the flight management computer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlightPhase {
    #[default]
    Preflight,
    Takeoff,
    Climb,
    Cruise,
    Descent,
    Approach,
    GoAround,
    Done,
}

impl FlightPhase {
    /// On or close to an airport, where the channel is shared with ground traffic.
    pub fn is_airport(&self) -> bool {
        matches!(
            self,
            FlightPhase::Preflight
                | FlightPhase::Takeoff
                | FlightPhase::Approach
                | FlightPhase::GoAround
                | FlightPhase::Done
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlightPhase::Climb | FlightPhase::Descent)
    }
}
