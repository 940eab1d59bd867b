//! # Telemetry responder
//!
//! Every command the simulator receives is answered with the same shaped
//! telemetry document, whatever the command contained and even if it could
//! not be parsed.

use comms_if::eqpt::rover::TelemetryResponse;

use crate::params::SensorParams;

/// Produces the telemetry response for each command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryResponder {
    ultrasonic_range_cm: f64,
}

impl TelemetryResponder {
    pub fn new(sensors: &SensorParams) -> Self {
        Self {
            ultrasonic_range_cm: sensors.ultrasonic_range_cm,
        }
    }

    /// Build the response to a command.
    pub fn respond(&self) -> TelemetryResponse {
        TelemetryResponse {
            ultrasonic_range: self.ultrasonic_range_cm,
        }
    }
}

impl Default for TelemetryResponder {
    fn default() -> Self {
        Self::new(&SensorParams::default())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_response_shape() {
        let resp = TelemetryResponder::default().respond();
        assert_eq!(resp.to_json(), r#"{"ultrasonicRange":80.0}"#);
    }
}
