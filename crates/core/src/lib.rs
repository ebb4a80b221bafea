//! Message model shared by every layer of the VHF datalink

pub mod message;
pub mod phase;
pub mod status;
pub mod weather;

pub use message::{Category, Direction, Message, MessageType, Network};
pub use phase::FlightPhase;
pub use status::{DatalinkError, Status};
pub use weather::{AtisType, WeatherKind, WeatherMessage, WeatherReport};
