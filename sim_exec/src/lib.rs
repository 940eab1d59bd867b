//! # Rover simulator library
//!
//! Simulates the motion of a rover with four independently steered wheel
//! stations from the commands sent to its actuators.
//!
//! Commands arrive as [`comms_if::eqpt::rover::SimCommand`] documents and are
//! merged into the actuator state by [`cmd_ingest`]. The
//! [`sim_clock::SimulationClock`] periodically runs the
//! [`kinematics::KinematicsEngine`] on that state to advance the pose.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod actuators;
pub mod cmd_ingest;
pub mod geometry;
pub mod kinematics;
pub mod loc;
pub mod params;
pub mod rover_api;
pub mod script_player;
pub mod sim_clock;
pub mod sim_server;
pub mod sim_state;
pub mod telemetry;
