//! # Localisation module
//!
//! The simulated rover's pose in the world frame. The world frame has +y
//! pointing forward at heading 0, and heading increases clockwise (turning
//! right).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};
use util::maths::wrap_deg_360;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and heading in the world frame) of the rover.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    /// Units: centimeters
    pub x: f64,

    /// Units: centimeters
    pub y: f64,

    /// Heading of the rover, clockwise from the world +y axis. Accumulates
    /// without wrapping, so two full turns right reads 720.
    ///
    /// Units: degrees
    pub heading_degrees: f64,
}

/// A pose stamped with the simulation time it was reached at, as written to
/// the pose archive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoseRecord {
    pub num_ticks: u64,
    pub sim_time_s: f64,
    pub x_cm: f64,
    pub y_cm: f64,
    pub heading_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x: f64, y: f64, heading_degrees: f64) -> Self {
        Self { x, y, heading_degrees }
    }

    /// Position in the world frame.
    pub fn position_cm(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Rotation taking a body frame vector into the world frame.
    pub fn body_to_world(&self) -> Rotation2<f64> {
        Rotation2::new(-self.heading_degrees.to_radians())
    }

    /// Unit vector in the direction the rover faces.
    pub fn forward(&self) -> Vector2<f64> {
        let h = self.heading_degrees.to_radians();
        Vector2::new(h.sin(), h.cos())
    }

    /// Heading wrapped into `[0, 360)`.
    pub fn heading_wrapped_deg(&self) -> f64 {
        wrap_deg_360(self.heading_degrees)
    }
}

impl PoseRecord {
    pub fn new(pose: &Pose, num_ticks: u64, sim_time_s: f64) -> Self {
        Self {
            num_ticks,
            sim_time_s,
            x_cm: pose.x,
            y_cm: pose.y,
            heading_deg: pose.heading_degrees,
        }
    }
}
