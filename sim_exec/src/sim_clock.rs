//! # Simulation clock
//!
//! Runs the kinematics on a background thread at a fixed target period. Each
//! tick is given the real time since the previous one, so a late tick moves
//! the rover further rather than slowing the simulation down.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use log::{debug, info, warn};

// Internal
use crate::kinematics::KinematicsEngine;
use crate::loc::PoseRecord;
use crate::sim_state::SimHandle;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive overruns after which a warning is raised.
const OVERRUN_WARN_LIMIT: u64 = 10;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A running simulation clock. Dropping the clock stops it.
pub struct SimulationClock {
    run: Arc<AtomicBool>,
    jh: Option<JoinHandle<KinematicsEngine>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    #[error("Tick period must be positive and finite, got {0} s")]
    InvalidPeriod(f64),

    #[error("Could not start the clock thread: {0}")]
    SpawnError(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimulationClock {
    /// Start ticking `sim` every `period_s` seconds.
    ///
    /// If `pose_sender` is given the pose record of each tick is sent on it.
    pub fn start(
        sim: SimHandle,
        engine: KinematicsEngine,
        period_s: f64,
        pose_sender: Option<Sender<PoseRecord>>,
    ) -> Result<Self, ClockError> {
        if !(period_s.is_finite() && period_s > 0.0) {
            return Err(ClockError::InvalidPeriod(period_s));
        }
        let period = Duration::from_secs_f64(period_s);

        let run = Arc::new(AtomicBool::new(true));
        let run_clone = run.clone();

        let jh = thread::Builder::new()
            .name("sim_clock".into())
            .spawn(move || {
                clock_thread(sim, engine, period, pose_sender, run_clone)
            })
            .map_err(ClockError::SpawnError)?;

        info!("Simulation clock started at {:.3} s period", period_s);

        Ok(Self {
            run,
            jh: Some(jh),
        })
    }

    /// Stop the clock, waiting for any tick in progress to finish. No tick
    /// occurs once this returns.
    ///
    /// The engine is handed back if the clock thread exited cleanly.
    pub fn stop(mut self) -> Option<KinematicsEngine> {
        self.stop_thread()
    }

    pub fn is_running(&self) -> bool {
        self.run.load(Ordering::Relaxed)
    }

    fn stop_thread(&mut self) -> Option<KinematicsEngine> {
        self.run.store(false, Ordering::Relaxed);

        let engine = match self.jh.take()?.join() {
            Ok(e) => Some(e),
            Err(_) => {
                warn!("Simulation clock thread panicked");
                None
            }
        };

        info!("Simulation clock stopped");

        engine
    }
}

impl Drop for SimulationClock {
    fn drop(&mut self) {
        self.stop_thread();
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn clock_thread(
    sim: SimHandle,
    mut engine: KinematicsEngine,
    period: Duration,
    pose_sender: Option<Sender<PoseRecord>>,
    run: Arc<AtomicBool>,
) -> KinematicsEngine {
    let mut pose_sender = pose_sender;
    let mut last_tick = Instant::now();
    let mut num_consec_overruns: u64 = 0;

    while run.load(Ordering::Relaxed) {
        let cycle_start = Instant::now();
        let dt_s = cycle_start.duration_since(last_tick).as_secs_f64();
        last_tick = cycle_start;

        if let Some(rec) = sim.tick(&mut engine, dt_s) {
            // Stop sending once the archive has gone
            let disconnected = match pose_sender {
                Some(ref tx) => tx.send(rec).is_err(),
                None => false,
            };
            if disconnected {
                debug!("Pose archive disconnected, no longer archiving");
                pose_sender = None;
            }
        }

        let cycle_dur = cycle_start.elapsed();

        match period.checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_overruns = 0;
                thread::sleep(d);
            }
            None => {
                num_consec_overruns += 1;
                if num_consec_overruns == OVERRUN_WARN_LIMIT {
                    warn!(
                        "Simulation tick overran {} times in a row, last by \
                        {:.06} s",
                        num_consec_overruns,
                        (cycle_dur - period).as_secs_f64()
                    );
                }
            }
        }
    }

    engine
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::rover::SimCommand;
    use std::sync::mpsc;

    #[test]
    fn test_clock_ticks_and_stops() {
        let sim = SimHandle::new();
        sim.apply_command(&SimCommand::default()
            .with_left_motor(100.0, 0.0)
            .with_right_motor(100.0, 0.0)
        );

        let (tx, rx) = mpsc::channel();
        let clock = SimulationClock::start(
            sim.clone(),
            KinematicsEngine::default(),
            0.01,
            Some(tx),
        ).unwrap();
        assert!(clock.is_running());

        thread::sleep(Duration::from_millis(200));
        assert!(clock.stop().is_some());

        let stopped = sim.state();
        assert!(stopped.num_ticks > 0);
        assert!(stopped.pose.y > 0.0);

        // Real time drives the motion, 10 cm/s over the time ticked
        assert!((stopped.pose.y - 10.0 * stopped.sim_time_s).abs() < 1e-6);

        // Nothing moves once stopped
        thread::sleep(Duration::from_millis(50));
        assert_eq!(sim.state().num_ticks, stopped.num_ticks);

        let records: Vec<PoseRecord> = rx.try_iter().collect();
        assert_eq!(records.len() as u64, stopped.num_ticks);
    }

    #[test]
    fn test_invalid_period() {
        let res = SimulationClock::start(
            SimHandle::new(),
            KinematicsEngine::default(),
            0.0,
            None,
        );
        assert!(matches!(res, Err(ClockError::InvalidPeriod(_))));
    }
}
