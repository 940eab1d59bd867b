//! Simulator executable parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulator executable
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimExecParams {
    /// Target period of the simulation clock.
    ///
    /// Units: seconds
    pub tick_period_s: f64,

    /// If true every tick's pose is written to `arch/pose.csv`
    pub archive_pose: bool,

    /// Values reported by the stubbed sensors
    pub sensors: SensorParams,
}

/// Constant readings returned by the sensor stubs.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SensorParams {
    /// Ultrasonic range reported with every command.
    ///
    /// Units: centimeters
    pub ultrasonic_range_cm: f64,

    /// Left and right IR obstacle sensors
    pub ir_obstacle: [bool; 2],

    /// Left and right IR line sensors
    pub ir_line: [bool; 2],

    /// Light sensor readings from 0 to 1023, in the order front left, front
    /// right, back left, back right
    pub light: [u16; 4],

    /// Battery pack voltage, above 7.2 V is healthy.
    ///
    /// Units: volts
    pub battery_v: f64,

    /// State of the tact switch
    pub switch_pressed: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimExecParams {
    fn default() -> Self {
        Self {
            tick_period_s: 0.1,
            archive_pose: true,
            sensors: SensorParams::default(),
        }
    }
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            ultrasonic_range_cm: 80.0,
            ir_obstacle: [false; 2],
            ir_line: [false; 2],
            light: [512; 4],
            battery_v: 8.0,
            switch_pressed: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load() {
        let p: SimExecParams = util::params::from_str(
            "tick_period_s = 0.05\n[sensors]\nultrasonic_range_cm = 12.5\n"
        ).unwrap();

        assert_eq!(p.tick_period_s, 0.05);
        assert!(p.archive_pose);
        assert_eq!(p.sensors.ultrasonic_range_cm, 12.5);
        assert_eq!(p.sensors.ir_line, [false; 2]);
        assert_eq!(p.sensors.light, [512; 4]);
    }

    #[test]
    fn test_shipped_file_matches_default() {
        let p: SimExecParams = util::params::load_from_path(concat!(
            env!("CARGO_MANIFEST_DIR"), "/../params/sim_exec.toml"
        )).unwrap();

        assert_eq!(p, SimExecParams::default());
    }
}
