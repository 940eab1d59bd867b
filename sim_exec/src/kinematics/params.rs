//! Parameters structure for the kinematics engine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use comms_if::eqpt::rover::NUM_SERVOS;

use super::KinematicsError;
use crate::geometry::{Station, VehicleGeometry};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the kinematics engine.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Params {

    // ---- GEOMETRY ----

    /// Dimensions of the vehicle
    pub geometry: VehicleGeometry,

    // ---- CALIBRATION ----

    /// Linear speed of a wheel driven at duty 100.
    ///
    /// Units: centimeters/second
    pub full_speed_cm_s: f64,

    /// Steer angles within this of dead ahead (or dead astern) are driven
    /// as straight lines, avoiding the diverging turn radius. Must be in
    /// `(0, 90)`.
    ///
    /// Units: degrees
    pub min_steer_angle_deg: f64,

    // ---- MAPPING ----

    /// Servo channel driving each station's steering
    pub steering: SteeringChannels,

    /// How the stations' candidate headings are blended
    pub heading_mean: HeadingMean,
}

/// Servo channel assigned to the steering of each station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SteeringChannels {
    pub front_left: usize,
    pub front_right: usize,
    pub rear_left: usize,
    pub rear_right: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Policy for averaging the candidate headings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum HeadingMean {
    /// Treat the candidates as directions, safe across the 0/360 boundary
    Circular,

    /// Plain element-wise mean
    Arithmetic,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            geometry: VehicleGeometry::default(),
            full_speed_cm_s: 10.0,
            min_steer_angle_deg: 0.1,
            steering: SteeringChannels::default(),
            heading_mean: HeadingMean::Circular,
        }
    }
}

impl Params {
    /// Check the parameters can be used to simulate a rover.
    pub fn validate(&self) -> Result<(), KinematicsError> {
        if !self.geometry.is_valid() {
            return Err(KinematicsError::InvalidParams(format!(
                "geometry must be positive and finite, got {:?}",
                self.geometry
            )));
        }

        if !self.full_speed_cm_s.is_finite() {
            return Err(KinematicsError::InvalidParams(format!(
                "full_speed_cm_s must be finite, got {}",
                self.full_speed_cm_s
            )));
        }

        if !(self.min_steer_angle_deg > 0.0
            && self.min_steer_angle_deg < 90.0)
        {
            return Err(KinematicsError::InvalidParams(format!(
                "min_steer_angle_deg must be in (0, 90), got {}",
                self.min_steer_angle_deg
            )));
        }

        if let Some(ch) = self.steering.channels()
            .iter()
            .find(|ch| **ch >= NUM_SERVOS)
        {
            return Err(KinematicsError::InvalidParams(format!(
                "steering channel {} does not exist", ch
            )));
        }

        Ok(())
    }
}

impl Default for SteeringChannels {
    fn default() -> Self {
        Self {
            front_left: 9,
            front_right: 15,
            rear_left: 11,
            rear_right: 13,
        }
    }
}

impl SteeringChannels {
    /// Servo channel steering the given station.
    pub fn channel(&self, station: Station) -> usize {
        match station {
            Station::FrontLeft => self.front_left,
            Station::FrontRight => self.front_right,
            Station::RearLeft => self.rear_left,
            Station::RearRight => self.rear_right,
        }
    }

    /// All channels, in station order.
    pub fn channels(&self) -> [usize; 4] {
        [self.front_left, self.front_right, self.rear_left, self.rear_right]
    }
}

impl Default for HeadingMean {
    fn default() -> Self {
        HeadingMean::Circular
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let p: Params = util::params::from_str(
            "full_speed_cm_s = 20.0\nheading_mean = \"Arithmetic\"\n"
        ).unwrap();

        assert_eq!(p.full_speed_cm_s, 20.0);
        assert_eq!(p.heading_mean, HeadingMean::Arithmetic);
        assert_eq!(p.steering, SteeringChannels::default());
    }

    #[test]
    fn test_invalid() {
        let mut p = Params::default();
        p.steering.rear_right = 16;
        assert!(p.validate().is_err());

        let mut p = Params::default();
        p.min_steer_angle_deg = 0.0;
        assert!(p.validate().is_err());

        p.min_steer_angle_deg = 90.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_shipped_file_matches_default() {
        let p: Params = util::params::load_from_path(concat!(
            env!("CARGO_MANIFEST_DIR"), "/../params/kinematics.toml"
        )).unwrap();

        assert_eq!(p, Params::default());

        let net: comms_if::net::NetParams = util::params::load_from_path(
            concat!(env!("CARGO_MANIFEST_DIR"), "/../params/net.toml")
        ).unwrap();
        assert_eq!(net, comms_if::net::NetParams::default());
    }
}
