//! # Command ingestor
//!
//! Merges command documents into the actuator state. Every section of a
//! command is optional and anything the command doesn't mention is left
//! untouched. Bad entries (unknown servo channels or LEDs) are discarded one
//! at a time, the rest of the document is still applied.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use util::maths::clamp;

// Internal
use comms_if::eqpt::rover::{SimCommand, MAX_DUTY};
use crate::actuators::{ActuatorState, Rgb, Side};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of what was done with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    /// Number of entries written into the actuator state
    pub num_applied: usize,

    /// Number of entries thrown away
    pub num_discarded: usize,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply a command to the actuator state.
///
/// The caller must hold exclusive access to `state` for the whole call so
/// that nobody observes a partially applied command.
pub fn exec(state: &mut ActuatorState, cmd: &SimCommand) -> IngestReport {
    let mut report = IngestReport::default();

    if let Some(ref motors) = cmd.wheel_motors {
        for (side, duties) in [(Side::Left, motors.l), (Side::Right, motors.r)]
            .iter()
        {
            if let Some([fwd, rev]) = duties {
                state.set_drive(*side, motor_speed(*fwd, *rev));
                report.num_applied += 1;
            }
        }
    }

    if let Some(ref servos) = cmd.servos {
        for (key, angle_deg) in servos.iter() {
            let res = key.trim().parse::<i64>()
                .map_err(|_| format!("non-numeric channel {:?}", key))
                .and_then(|ch| {
                    state.set_servo(ch, *angle_deg).map_err(|e| e.to_string())
                });

            match res {
                Ok(()) => report.num_applied += 1,
                Err(e) => {
                    debug!("Discarding servo entry: {}", e);
                    report.num_discarded += 1;
                }
            }
        }
    }

    if let Some(ref leds) = cmd.rgb_leds {
        for (key, rgb) in leds.iter() {
            let res = key.trim().parse::<i64>()
                .map_err(|_| format!("non-numeric LED {:?}", key))
                .and_then(|id| {
                    state.set_led(id, Rgb::from(*rgb))
                        .map_err(|e| e.to_string())
                });

            match res {
                Ok(()) => report.num_applied += 1,
                Err(e) => {
                    debug!("Discarding LED entry: {}", e);
                    report.num_discarded += 1;
                }
            }
        }
    }

    trace!(
        "Command ingested: {} applied, {} discarded",
        report.num_applied, report.num_discarded
    );

    report
}

/// Combine the forward and reverse duties of one motor into a signed speed.
///
/// Both duties above zero drives both PWM channels high which brakes the
/// motor, so the speed is exactly zero whatever the magnitudes. Duties are
/// limited to `[0, 100]` and rounded first.
pub fn motor_speed(forward_duty: f64, reverse_duty: f64) -> i32 {
    let fwd = normalise_duty(forward_duty);
    let rev = normalise_duty(reverse_duty);

    if fwd > 0 && rev > 0 {
        0
    }
    else {
        fwd - rev
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn normalise_duty(duty: f64) -> i32 {
    if !duty.is_finite() {
        return 0;
    }

    clamp(&duty, &0.0, &MAX_DUTY).round() as i32
}
