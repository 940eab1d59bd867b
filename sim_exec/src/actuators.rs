//! # Actuator state
//!
//! Holds the commanded state of every actuator on the simulated rover: the
//! two drive motor sides, the sixteen servo channels and the four RGB LEDs.
//! Only the command ingestor mutates this state, everything else reads copies
//! of it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::rover::{NUM_LEDS, NUM_SERVOS};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Largest magnitude of signed drive speed.
pub const MAX_DRIVE_SPEED: i32 = 100;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Commanded state of all actuators.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActuatorState {
    /// Drive motor speeds
    pub drive: DriveMotors,

    /// Servo angle for each channel.
    ///
    /// Units: degrees
    pub servos_deg: [f64; NUM_SERVOS],

    /// Colour of each LED
    pub leds: [Rgb; NUM_LEDS],
}

/// Signed drive speed of each side of the rover, in the range `[-100, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriveMotors {
    pub speed_left: i32,
    pub speed_right: i32,
}

/// An LED colour, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// A side of the rover. All wheels on a side share one drive motor demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Errors raised when mutating the actuator state.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ActuatorError {
    #[error(
        "Servo channel {0} does not exist (expected 0 to {max})",
        max = NUM_SERVOS - 1
    )]
    InvalidServo(i64),

    #[error("LED {0} does not exist (expected 0 to {max})", max = NUM_LEDS - 1)]
    InvalidLed(i64),
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl ActuatorState {
    /// Set the angle of a servo channel.
    ///
    /// The angle is not limited here, the servo range is a property of the
    /// hardware being simulated rather than of the state.
    pub fn set_servo(
        &mut self, channel: i64, angle_deg: f64
    ) -> Result<(), ActuatorError> {
        let idx = index_in(channel, NUM_SERVOS)
            .ok_or(ActuatorError::InvalidServo(channel))?;
        self.servos_deg[idx] = angle_deg;
        Ok(())
    }

    /// Set the colour of an LED.
    pub fn set_led(&mut self, led: i64, rgb: Rgb) -> Result<(), ActuatorError> {
        let idx = index_in(led, NUM_LEDS)
            .ok_or(ActuatorError::InvalidLed(led))?;
        self.leds[idx] = rgb;
        Ok(())
    }

    /// Set the drive speed of one side, limited to `[-100, 100]`.
    pub fn set_drive(&mut self, side: Side, speed: i32) {
        let speed = speed.max(-MAX_DRIVE_SPEED).min(MAX_DRIVE_SPEED);

        match side {
            Side::Left => self.drive.speed_left = speed,
            Side::Right => self.drive.speed_right = speed,
        }
    }
}

impl DriveMotors {
    /// Get the speed of one side.
    pub fn speed(&self, side: Side) -> i32 {
        match side {
            Side::Left => self.speed_left,
            Side::Right => self.speed_right,
        }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(rgb: [u8; 3]) -> Self {
        Rgb(rgb[0], rgb[1], rgb[2])
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(rgb: Rgb) -> Self {
        [rgb.0, rgb.1, rgb.2]
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert `id` into an index if it lies in `[0, len)`.
fn index_in(id: i64, len: usize) -> Option<usize> {
    if id >= 0 && (id as u64) < len as u64 {
        Some(id as usize)
    } else {
        None
    }
}
