//! # Kinematics module
//!
//! Advances the rover's pose from the actuator state. Each of the four wheel
//! stations proposes a new pose as if it alone moved the rover, and the
//! proposals are blended into the tick's result.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;
mod station;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;
pub use station::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of independently steered wheel stations on the rover.
pub const NUM_STATIONS: usize = 4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during kinematics processing.
#[derive(Debug, thiserror::Error)]
pub enum KinematicsError {
    #[error("Time step must be finite and non-negative, got {0} s")]
    InvalidTimeStep(f64),

    #[error("Invalid kinematics parameters: {0}")]
    InvalidParams(String),

    #[error("Could not load the kinematics parameters: {0}")]
    ParamLoadError(util::params::LoadError),
}
