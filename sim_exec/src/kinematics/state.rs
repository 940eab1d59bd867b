//! Implementations for the kinematics engine state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{
    blend_candidates, calc_candidate, KinematicsError, Params,
    StationCandidate, NUM_STATIONS,
};
use crate::actuators::ActuatorState;
use crate::geometry::STATIONS;
use crate::loc::Pose;
use util::{params, module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematics engine module state
#[derive(Debug, Default)]
pub struct KinematicsEngine {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,
}

/// Input data to the kinematics engine.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Actuator demands at the time of the tick
    pub actuators: ActuatorState,

    /// Pose at the start of the tick
    pub pose: Pose,

    /// Real time elapsed since the previous tick.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// Status report for kinematics processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    /// Stations whose steer angle was treated as dead ahead, in station
    /// order.
    pub straight_fallback: [bool; NUM_STATIONS],

    /// True if no station was driven during the tick
    pub stationary: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for KinematicsEngine {
    const NAME: &'static str = "Kinematics";

    type InitData = &'static str;
    type InitError = KinematicsError;

    type InputData = InputData;
    type OutputData = Pose;
    type StatusReport = StatusReport;
    type ProcError = KinematicsError;

    /// Initialise the kinematics engine.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(&mut self, init_data: Self::InitData, _session: &Session)
        -> Result<(), Self::InitError>
    {
        let params: Params = params::load(init_data)
            .map_err(KinematicsError::ParamLoadError)?;

        params.validate()?;
        self.params = params;

        Ok(())
    }

    /// Advance the pose by one tick.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let dt_s = input_data.dt_s;
        if !(dt_s.is_finite() && dt_s >= 0.0) {
            return Err(KinematicsError::InvalidTimeStep(dt_s));
        }

        self.report = StatusReport::default();

        let act = &input_data.actuators;
        let mut candidates = [StationCandidate {
            pose: input_data.pose,
            straight: true,
        }; NUM_STATIONS];

        for station in STATIONS.iter() {
            let i = station.index();
            let steer_deg =
                act.servos_deg[self.params.steering.channel(*station)];

            candidates[i] = calc_candidate(
                &self.params,
                &input_data.pose,
                self.params.geometry.station_pos_cm_rb(*station),
                steer_deg,
                act.drive.speed(station.side()),
                dt_s,
            );
            self.report.straight_fallback[i] = candidates[i].straight;
        }

        self.report.stationary =
            act.drive.speed_left == 0 && act.drive.speed_right == 0;

        let pose = blend_candidates(&candidates, self.params.heading_mean)
            .unwrap_or(input_data.pose);

        trace!(
            "Kinematics: dt {:.4} s, pose ({:.3}, {:.3}, {:.3} deg)",
            dt_s, pose.x, pose.y, pose.heading_degrees
        );

        Ok((pose, self.report))
    }
}

impl KinematicsEngine {
    /// Create an engine from already loaded parameters.
    pub fn with_params(params: Params) -> Result<Self, KinematicsError> {
        params.validate()?;

        Ok(Self {
            params,
            report: StatusReport::default(),
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Status report from the most recent tick.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::Station;
    use crate::kinematics::HeadingMean;

    const TOL: f64 = 1e-6;

    fn engine() -> KinematicsEngine {
        KinematicsEngine::with_params(Params::default()).unwrap()
    }

    fn drive(left: i32, right: i32) -> ActuatorState {
        let mut act = ActuatorState::default();
        act.drive.speed_left = left;
        act.drive.speed_right = right;
        act
    }

    fn point_turn(engine: &KinematicsEngine, left: i32, right: i32)
        -> ActuatorState
    {
        let mut act = drive(left, right);
        let p = engine.params();
        for station in STATIONS.iter() {
            act.servos_deg[p.steering.channel(*station)] =
                p.geometry.point_turn_steer_deg(*station);
        }
        act
    }

    #[test]
    fn test_straight_line() {
        let mut eng = engine();

        let (pose, report) = eng.proc(&InputData {
            actuators: drive(100, 100),
            pose: Pose::default(),
            dt_s: 1.0,
        }).unwrap();

        assert!(pose.x.abs() < TOL);
        assert!((pose.y - 10.0).abs() < TOL);
        assert!(pose.heading_degrees.abs() < TOL);
        assert_eq!(report.straight_fallback, [true; NUM_STATIONS]);
        assert!(!report.stationary);
    }

    #[test]
    fn test_reversed_steering_drives_back() {
        let mut eng = engine();

        for steer_deg in [180.0, -180.0].iter() {
            let mut act = drive(100, 100);
            for ch in eng.params().steering.channels().iter() {
                act.servos_deg[*ch] = *steer_deg;
            }

            let (pose, report) = eng.proc(&InputData {
                actuators: act,
                pose: Pose::new(3.7, 1.3, 0.0),
                dt_s: 1.0,
            }).unwrap();

            assert!((pose.x - 3.7).abs() < TOL);
            assert!((pose.y + 8.7).abs() < TOL);
            assert!(pose.heading_degrees.abs() < TOL);
            assert_eq!(report.straight_fallback, [true; NUM_STATIONS]);
        }
    }

    #[test]
    fn test_point_turn_is_pure_rotation() {
        let mut eng = engine();
        let act = point_turn(&eng, 100, -100);

        let (pose, report) = eng.proc(&InputData {
            actuators: act,
            pose: Pose::new(5.0, -3.0, 30.0),
            dt_s: 1.0,
        }).unwrap();

        // Every station circles the body origin at the station radius
        let radius_cm = eng.params().geometry.station_radius_cm();
        let expected_deg = (10.0 / radius_cm).to_degrees();

        assert!((pose.x - 5.0).abs() < TOL);
        assert!((pose.y + 3.0).abs() < TOL);
        assert!((pose.heading_degrees - 30.0 - expected_deg).abs() < TOL);
        assert_eq!(report.straight_fallback, [false; NUM_STATIONS]);
    }

    #[test]
    fn test_point_turn_left() {
        let mut eng = engine();
        let act = point_turn(&eng, -100, 100);

        let (pose, _) = eng.proc(&InputData {
            actuators: act,
            pose: Pose::default(),
            dt_s: 0.5,
        }).unwrap();

        let radius_cm = eng.params().geometry.station_radius_cm();
        let expected_deg = -(5.0 / radius_cm).to_degrees();

        assert!(pose.position_cm().norm() < TOL);
        assert!((pose.heading_degrees - expected_deg).abs() < TOL);
    }

    #[test]
    fn test_zero_dt_no_motion() {
        let mut eng = engine();
        let start = Pose::new(1.0, 2.0, 370.0);

        let (pose, _) = eng.proc(&InputData {
            actuators: point_turn(&eng, 100, -100),
            pose: start,
            dt_s: 0.0,
        }).unwrap();

        assert!((pose.position_cm() - start.position_cm()).norm() < TOL);
        assert!((pose.heading_degrees - 370.0).abs() < TOL);
    }

    #[test]
    fn test_invalid_dt() {
        let mut eng = engine();
        let input = InputData {
            actuators: drive(100, 100),
            pose: Pose::default(),
            dt_s: -0.1,
        };

        assert!(matches!(
            eng.proc(&input),
            Err(KinematicsError::InvalidTimeStep(_))
        ));
        assert!(eng.proc_or_warn(&input).is_none());
    }

    #[test]
    fn test_stationary() {
        let mut eng = engine();
        let mut act = drive(0, 0);
        act.servos_deg[9] = 45.0;

        let (pose, report) = eng.proc(&InputData {
            actuators: act,
            pose: Pose::new(3.0, 4.0, 5.0),
            dt_s: 1.0,
        }).unwrap();

        assert!((pose.x - 3.0).abs() < TOL);
        assert!((pose.y - 4.0).abs() < TOL);
        assert!((pose.heading_degrees - 5.0).abs() < TOL);
        assert!(report.stationary);
        assert!(!report.straight_fallback[Station::FrontLeft.index()]);
    }

    #[test]
    fn test_frame_rate_independence() {
        // Ten short ticks of a straight drive cover the same ground as one
        // long one
        let mut eng = engine();
        let act = drive(60, 60);
        let start = Pose::new(0.0, 0.0, 45.0);

        let mut pose = start;
        for _ in 0..10 {
            pose = eng.proc(&InputData {
                actuators: act,
                pose,
                dt_s: 0.1,
            }).unwrap().0;
        }

        let (one, _) = eng.proc(&InputData {
            actuators: act,
            pose: start,
            dt_s: 1.0,
        }).unwrap();

        assert!((pose.position_cm() - one.position_cm()).norm() < TOL);
        assert!((one.position_cm().norm() - 6.0).abs() < TOL);
    }

    #[test]
    fn test_point_turn_rate_independent() {
        let mut eng = engine();
        let act = point_turn(&eng, 100, -100);

        let mut pose = Pose::default();
        for _ in 0..4 {
            pose = eng.proc(&InputData {
                actuators: act,
                pose,
                dt_s: 0.25,
            }).unwrap().0;
        }

        let (one, _) = eng.proc(&InputData {
            actuators: act,
            pose: Pose::default(),
            dt_s: 1.0,
        }).unwrap();

        assert!((pose.heading_degrees - one.heading_degrees).abs() < TOL);
    }

    #[test]
    fn test_full_turns_accumulate() {
        let mut eng = engine();
        let act = point_turn(&eng, 100, -100);

        // Long enough for more than one revolution in a single tick
        let radius_cm = eng.params().geometry.station_radius_cm();
        let dt_s = 1.5 * 2.0 * std::f64::consts::PI * radius_cm / 10.0;

        let (pose, _) = eng.proc(&InputData {
            actuators: act,
            pose: Pose::default(),
            dt_s,
        }).unwrap();

        assert!((pose.heading_degrees - 540.0).abs() < 1e-4);
    }

    #[test]
    fn test_arithmetic_policy() {
        let mut params = Params::default();
        params.heading_mean = HeadingMean::Arithmetic;
        let mut eng = KinematicsEngine::with_params(params).unwrap();

        let (pose, _) = eng.proc(&InputData {
            actuators: drive(100, 100),
            pose: Pose::new(0.0, 0.0, 359.0),
            dt_s: 1.0,
        }).unwrap();

        assert!((pose.heading_degrees - 359.0).abs() < TOL);
    }
}
