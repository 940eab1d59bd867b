//! # Rover Equipment Commands
//!
//! Documents exchanged with the rover simulator. A client sends a [`SimCommand`] describing the
//! actuator demands it wants to change, and the simulator always answers with a
//! [`TelemetryResponse`].
//!
//! All sections of a command are optional. The simulator merges only what is present into its
//! actuator state, so a client only needs to send the actuators it wants to change:
//!
//! ```json
//! {
//!   "wheelMotors": { "l": [100, 0], "r": [0, 100] },
//!   "servos": { "0": 0, "15": -10 },
//!   "rgbLeds": { "0": [255, 0, 0], "3": [0, 255, 255] }
//! }
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of servo channels addressable on the rover.
pub const NUM_SERVOS: usize = 16;

/// Number of RGB LEDs on the rover.
pub const NUM_LEDS: usize = 4;

/// Maximum duty which can be demanded on a single PWM channel.
pub const MAX_DUTY: f64 = 100.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A command document sent from a client to the simulator.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimCommand {
    /// Drive motor demands, per side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wheel_motors: Option<WheelMotorsCmd>,

    /// Servo angle demands keyed by channel index (`"0"` to `"15"`).
    ///
    /// Units: degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servos: Option<BTreeMap<String, f64>>,

    /// LED colour demands keyed by LED index (`"0"` to `"3"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb_leds: Option<BTreeMap<String, [u8; 3]>>,
}

/// Drive motor demands for the left and right sides of the rover.
///
/// Each side is driven by two PWM channels, one per direction, given as `[forward, reverse]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelMotorsCmd {
    /// Left side `[forward, reverse]` duty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l: Option<[f64; 2]>,

    /// Right side `[forward, reverse]` duty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<[f64; 2]>,
}

/// The response sent by the simulator for every command it receives.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryResponse {
    /// Range reported by the ultrasonic sensor.
    ///
    /// Units: centimeters
    pub ultrasonic_range: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while parsing a command document.
#[derive(Debug, thiserror::Error)]
pub enum CommandParseError {
    #[error("Command body is not valid UTF-8")]
    NotUtf8,

    #[error("Command is not a valid command document: {0}")]
    InvalidDocument(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimCommand {
    /// Parse a command from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, CommandParseError> {
        serde_json::from_str(json_str).map_err(CommandParseError::InvalidDocument)
    }

    /// Parse a command from the raw bytes of a request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, CommandParseError> {
        let body_str = std::str::from_utf8(body).map_err(|_| CommandParseError::NotUtf8)?;

        Self::from_json(body_str)
    }

    /// Returns true if the command has no sections to apply.
    pub fn is_empty(&self) -> bool {
        self.wheel_motors.is_none() && self.servos.is_none() && self.rgb_leds.is_none()
    }

    /// Set the left side `[forward, reverse]` duties.
    pub fn with_left_motor(mut self, forward: f64, reverse: f64) -> Self {
        self.wheel_motors.get_or_insert_with(WheelMotorsCmd::default).l = Some([forward, reverse]);
        self
    }

    /// Set the right side `[forward, reverse]` duties.
    pub fn with_right_motor(mut self, forward: f64, reverse: f64) -> Self {
        self.wheel_motors.get_or_insert_with(WheelMotorsCmd::default).r = Some([forward, reverse]);
        self
    }

    /// Set the angle of a single servo channel.
    pub fn with_servo(mut self, channel: usize, angle_deg: f64) -> Self {
        self.servos
            .get_or_insert_with(BTreeMap::new)
            .insert(channel.to_string(), angle_deg);
        self
    }

    /// Set the colour of a single LED.
    pub fn with_led(mut self, led: usize, rgb: [u8; 3]) -> Self {
        self.rgb_leds
            .get_or_insert_with(BTreeMap::new)
            .insert(led.to_string(), rgb);
        self
    }
}

impl TelemetryResponse {
    /// Serialize the response into the JSON body sent to the client.
    pub fn to_json(&self) -> String {
        // A struct holding a single f64 always serializes. NaN becomes `null`.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_full_command() {
        let cmd = SimCommand::from_json(
            r#"{
                "wheelMotors": { "l": [100, 0], "r": [0, 100] },
                "servos": { "0": 0, "15": -10 },
                "rgbLeds": { "0": [255, 0, 0], "3": [0, 255, 255] }
            }"#,
        )
        .unwrap();

        let motors = cmd.wheel_motors.unwrap();
        assert_eq!(motors.l, Some([100.0, 0.0]));
        assert_eq!(motors.r, Some([0.0, 100.0]));

        let servos = cmd.servos.unwrap();
        assert_eq!(servos.len(), 2);
        assert_eq!(servos["15"], -10.0);

        let leds = cmd.rgb_leds.unwrap();
        assert_eq!(leds["3"], [0, 255, 255]);
    }

    #[test]
    fn test_partial_and_unknown_sections() {
        let cmd = SimCommand::from_json(
            r#"{ "wheelMotors": { "l": [20, 0] }, "location": { "x": 1 } }"#,
        )
        .unwrap();

        let motors = cmd.wheel_motors.unwrap();
        assert_eq!(motors.l, Some([20.0, 0.0]));
        assert_eq!(motors.r, None);
        assert!(cmd.servos.is_none());
        assert!(cmd.rgb_leds.is_none());
    }

    #[test]
    fn test_empty_command() {
        let cmd = SimCommand::from_json("{}").unwrap();
        assert!(cmd.is_empty());
        assert_eq!(cmd, SimCommand::default());
    }

    #[test]
    fn test_malformed_command() {
        assert!(SimCommand::from_json("not json").is_err());
        assert!(SimCommand::from_json("[1, 2, 3]").is_err());
        assert!(SimCommand::from_json(r#"{ "servos": { "1": "left" } }"#).is_err());
        assert!(SimCommand::from_slice(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_builder_matches_wire_format() {
        let cmd = SimCommand::default()
            .with_left_motor(100.0, 0.0)
            .with_servo(3, 45.0)
            .with_led(1, [1, 2, 3]);

        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["wheelMotors"]["l"][0], 100.0);
        assert!(json["wheelMotors"].get("r").is_none());
        assert_eq!(json["servos"]["3"], 45.0);
        assert_eq!(json["rgbLeds"]["1"][2], 3);
    }

    #[test]
    fn test_response_shape() {
        let resp = TelemetryResponse {
            ultrasonic_range: 80.0,
        };
        let value: serde_json::Value = serde_json::from_str(&resp.to_json()).unwrap();

        assert_eq!(value["ultrasonicRange"], 80.0);
        assert_eq!(value.as_object().unwrap().len(), 1);
    }
}
