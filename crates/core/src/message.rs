use serde::{Deserialize, Serialize};

/// Network family a message semantically belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// Airline operations network, the primary telex network.
    Company,
    /// ATC network that carries telex, clearances and CPDLC.
    Atc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Uplink,
    Downlink,
}

/// Concrete kind of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Freetext,
    Metar,
    Taf,
    Atis,
    /// Departure clearance request.
    Dcl,
    /// Oceanic clearance request.
    Ocl,
    Cpdlc,
    Unknown,
}

/// Routing class of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Telex,
    AtcClearance,
    AtcData,
    Unknown,
}

impl MessageType {
    pub const ALL: [MessageType; 8] = [
        MessageType::Freetext,
        MessageType::Metar,
        MessageType::Taf,
        MessageType::Atis,
        MessageType::Dcl,
        MessageType::Ocl,
        MessageType::Cpdlc,
        MessageType::Unknown,
    ];

    pub fn category(&self) -> Category {
        match self {
            MessageType::Freetext | MessageType::Metar | MessageType::Taf | MessageType::Atis => {
                Category::Telex
            }
            MessageType::Dcl => Category::AtcClearance,
            MessageType::Ocl | MessageType::Cpdlc => Category::AtcData,
            MessageType::Unknown => Category::Unknown,
        }
    }
}

/// A message crossing the datalink in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageType,
    pub network: Network,
    pub direction: Direction,
    /// Sender for uplinks, recipient for downlinks.
    pub station: String,
    pub body: String,
}

impl Message {
    pub fn new(
        kind: MessageType,
        network: Network,
        direction: Direction,
        station: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            network,
            direction,
            station: station.into(),
            body: body.into(),
        }
    }

    /// Free text downlink to `station` on `network`.
    pub fn telex(network: Network, station: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(MessageType::Freetext, network, Direction::Downlink, station, body)
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// Messages without a body carry nothing and are never delivered.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
