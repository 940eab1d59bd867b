//! # Simulation state
//!
//! The actuator state and pose of one simulated rover, shared between the
//! command path and the simulation clock behind a single mutex. Commands and
//! ticks each hold the lock for their whole update, so a tick sees a command
//! either fully applied or not at all.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::{Arc, Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

// Internal
use comms_if::eqpt::rover::{SimCommand, NUM_LEDS, NUM_SERVOS};
use util::module::State;
use crate::actuators::{ActuatorState, Rgb};
use crate::cmd_ingest::{self, IngestReport};
use crate::kinematics::{self, KinematicsEngine, StatusReport};
use crate::loc::{Pose, PoseRecord};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Everything that changes while a rover is simulated.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimState {
    pub actuators: ActuatorState,

    pub pose: Pose,

    /// Number of ticks performed
    pub num_ticks: u64,

    /// Sum of the time steps of every tick.
    ///
    /// Units: seconds
    pub sim_time_s: f64,

    /// Status of the most recent successful tick
    pub last_report: StatusReport,
}

/// A cloneable handle to one simulated rover.
#[derive(Debug, Clone, Default)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

/// Read-only view of the simulation for a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub pose: Pose,

    pub speed_left: i32,
    pub speed_right: i32,

    /// Angle of every servo channel, indexed by channel.
    ///
    /// Units: degrees
    pub servos: [f64; NUM_SERVOS],

    /// Colour of every LED, indexed by LED
    pub rgb_leds: [Rgb; NUM_LEDS],

    pub num_ticks: u64,

    /// Units: seconds
    pub sim_time_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimHandle {
    /// Create a handle to a new simulation, with all actuators off and the
    /// rover at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a command to the actuators atomically.
    pub fn apply_command(&self, cmd: &SimCommand) -> IngestReport {
        let mut state = self.lock();
        cmd_ingest::exec(&mut state.actuators, cmd)
    }

    /// Advance the simulation by `dt_s` seconds.
    ///
    /// A failed tick is logged and leaves the state untouched, in which case
    /// `None` is returned.
    pub fn tick(
        &self,
        engine: &mut KinematicsEngine,
        dt_s: f64,
    ) -> Option<PoseRecord> {
        let mut state = self.lock();

        let input = kinematics::InputData {
            actuators: state.actuators,
            pose: state.pose,
            dt_s,
        };
        let (pose, report) = engine.proc_or_warn(&input)?;

        state.pose = pose;
        state.last_report = report;
        state.num_ticks += 1;
        state.sim_time_s += dt_s;

        Some(PoseRecord::new(&pose, state.num_ticks, state.sim_time_s))
    }

    /// Take a read-only copy of the simulation for rendering.
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::from(&*self.lock())
    }

    /// Copy of the whole simulation state.
    pub fn state(&self) -> SimState {
        *self.lock()
    }

    pub fn pose(&self) -> Pose {
        self.lock().pose
    }

    pub fn actuators(&self) -> ActuatorState {
        self.lock().actuators
    }

    /// Lock the state. A panic while the lock was held can't leave a
    /// partial update behind since every update is computed before it is
    /// written, so a poisoned lock is used as is.
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl From<&SimState> for RenderSnapshot {
    fn from(state: &SimState) -> Self {
        Self {
            pose: state.pose,
            speed_left: state.actuators.drive.speed_left,
            speed_right: state.actuators.drive.speed_right,
            servos: state.actuators.servos_deg,
            rgb_leds: state.actuators.leds,
            num_ticks: state.num_ticks,
            sim_time_s: state.sim_time_s,
        }
    }
}
