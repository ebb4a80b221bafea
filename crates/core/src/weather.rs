use serde::{Deserialize, Serialize};

use crate::message::{Direction, Message, MessageType, Network};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtisType {
    Arrival,
    Departure,
    Enroute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherKind {
    Metar,
    Taf,
    Atis(AtisType),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub icao: String,
    pub report: String,
}

/// Result of a weather or ATIS request, filled in by the company network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherMessage {
    pub kind: WeatherKind,
    pub reports: Vec<WeatherReport>,
}

impl WeatherMessage {
    pub fn new(kind: WeatherKind) -> Self {
        Self {
            kind,
            reports: Vec::new(),
        }
    }

    pub fn push_report(&mut self, icao: impl Into<String>, report: impl Into<String>) {
        self.reports.push(WeatherReport {
            icao: icao.into(),
            report: report.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.reports.iter().all(|r| r.report.is_empty())
    }

    /// Flattens the reports into a single uplink telex.
    pub fn to_message(&self) -> Message {
        let kind = match self.kind {
            WeatherKind::Metar => MessageType::Metar,
            WeatherKind::Taf => MessageType::Taf,
            WeatherKind::Atis(_) => MessageType::Atis,
        };
        let station = self
            .reports
            .iter()
            .map(|r| r.icao.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let body = self
            .reports
            .iter()
            .map(|r| r.report.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Message::new(kind, Network::Company, Direction::Uplink, station, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_message_joins_reports() {
        let mut weather = WeatherMessage::new(WeatherKind::Metar);
        assert!(weather.is_empty());

        weather.push_report("EDDF", "EDDF 181020Z 24008KT CAVOK 14/06 Q1021");
        weather.push_report("EDDM", "EDDM 181020Z 27005KT 9999 FEW040 12/04 Q1022");
        assert!(!weather.is_empty());

        let msg = weather.to_message();
        assert_eq!(msg.kind, MessageType::Metar);
        assert_eq!(msg.station, "EDDF EDDM");
        assert_eq!(msg.body.lines().count(), 2);
    }
}
