//! Selection of the backend network for downlink messages

use vhf_datalink_core::{Category, DatalinkError, Message, Network};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    CompanyTelex,
    AtcTelex,
    AtcCpdlc,
}

/// Picks the network and message shape for `message`.
pub fn route(message: &Message) -> Result<Route, DatalinkError> {
    match message.category() {
        Category::Telex => match message.network {
            Network::Company => Ok(Route::CompanyTelex),
            Network::Atc => Ok(Route::AtcTelex),
        },
        // clearance requests ride the telex channel
        Category::AtcClearance => Ok(Route::AtcTelex),
        Category::AtcData => Ok(Route::AtcCpdlc),
        Category::Unknown => Err(DatalinkError::UnknownMessage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vhf_datalink_core::{Direction, MessageType};

    fn message(kind: MessageType, network: Network) -> Message {
        Message::new(kind, network, Direction::Downlink, "EDDF", "TEST")
    }

    #[test]
    fn test_telex_follows_network() {
        for kind in [MessageType::Freetext, MessageType::Metar, MessageType::Taf, MessageType::Atis] {
            assert_eq!(route(&message(kind, Network::Company)), Ok(Route::CompanyTelex));
            assert_eq!(route(&message(kind, Network::Atc)), Ok(Route::AtcTelex));
        }
    }

    #[test]
    fn test_clearance_ignores_network() {
        assert_eq!(route(&message(MessageType::Dcl, Network::Company)), Ok(Route::AtcTelex));
        assert_eq!(route(&message(MessageType::Dcl, Network::Atc)), Ok(Route::AtcTelex));
    }

    #[test]
    fn test_atc_data_uses_cpdlc() {
        for network in [Network::Company, Network::Atc] {
            assert_eq!(route(&message(MessageType::Cpdlc, network)), Ok(Route::AtcCpdlc));
            assert_eq!(route(&message(MessageType::Ocl, network)), Ok(Route::AtcCpdlc));
        }
    }

    #[test]
    fn test_every_type_is_routed_or_rejected() {
        for kind in MessageType::ALL {
            let result = route(&message(kind, Network::Atc));
            match kind {
                MessageType::Unknown => assert_eq!(result, Err(DatalinkError::UnknownMessage)),
                _ => assert!(result.is_ok(), "{:?} has no route", kind),
            }
        }
    }
}
