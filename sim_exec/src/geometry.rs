//! Vehicle geometry and wheel stations
//!
//! The rover body frame has +x to the right of the vehicle and +y forward,
//! with the origin at the centre of the fixed middle axle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::actuators::Side;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// All wheel stations, in the order used for per-station arrays.
pub const STATIONS: [Station; 4] = [
    Station::FrontLeft,
    Station::FrontRight,
    Station::RearLeft,
    Station::RearRight,
];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fixed dimensions of the vehicle.
///
/// All units are centimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleGeometry {
    /// Distance between the left and right wheel centres
    pub width_cm: f64,

    /// Overall length of the body
    pub length_cm: f64,

    /// Longitudinal distance between the front and rear steerable axles
    pub wheelbase_cm: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// One of the four independently steered wheel positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Station {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for VehicleGeometry {
    fn default() -> Self {
        Self {
            width_cm: 18.0,
            length_cm: 22.0,
            wheelbase_cm: 17.0,
        }
    }
}

impl VehicleGeometry {
    /// Position of a station's steer axis in the body frame.
    pub fn station_pos_cm_rb(&self, station: Station) -> Vector2<f64> {
        let x = match station.side() {
            Side::Left => -0.5 * self.width_cm,
            Side::Right => 0.5 * self.width_cm,
        };
        let y = if station.is_front() {
            0.5 * self.wheelbase_cm
        } else {
            -0.5 * self.wheelbase_cm
        };

        Vector2::new(x, y)
    }

    /// Magnitude of the steer angle which points every station's wheel
    /// perpendicular to the line joining it to the body origin.
    ///
    /// Units: degrees
    pub fn point_turn_angle_deg(&self) -> f64 {
        (self.wheelbase_cm / self.width_cm).atan().to_degrees()
    }

    /// Steer angle of a station during a point turn. Front left and rear
    /// right turn right (positive), the others turn left.
    pub fn point_turn_steer_deg(&self, station: Station) -> f64 {
        let angle = self.point_turn_angle_deg();

        match station {
            Station::FrontLeft | Station::RearRight => angle,
            Station::FrontRight | Station::RearLeft => -angle,
        }
    }

    /// Distance from the body origin to any station.
    ///
    /// Units: centimeters
    pub fn station_radius_cm(&self) -> f64 {
        (0.5 * self.wheelbase_cm).hypot(0.5 * self.width_cm)
    }

    /// Check the dimensions describe a real vehicle.
    pub fn is_valid(&self) -> bool {
        [self.width_cm, self.length_cm, self.wheelbase_cm]
            .iter()
            .all(|d| d.is_finite() && *d > 0.0)
    }
}

impl Station {
    /// The drive motor side the station belongs to.
    pub fn side(&self) -> Side {
        match self {
            Station::FrontLeft | Station::RearLeft => Side::Left,
            Station::FrontRight | Station::RearRight => Side::Right,
        }
    }

    pub fn is_front(&self) -> bool {
        matches!(self, Station::FrontLeft | Station::FrontRight)
    }

    /// Index into per-station arrays.
    pub fn index(&self) -> usize {
        match self {
            Station::FrontLeft => 0,
            Station::FrontRight => 1,
            Station::RearLeft => 2,
            Station::RearRight => 3,
        }
    }
}
