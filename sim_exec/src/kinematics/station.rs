//! Per-station candidate pose calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::PI;
use nalgebra::{Rotation2, Vector2};
use util::maths::{circular_mean_deg, mean};

use super::{HeadingMean, Params};
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose one station would move the rover to if it were the only wheel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationCandidate {
    pub pose: Pose,

    /// True if the steer angle was small enough to be treated as straight
    pub straight: bool,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the candidate pose for a single station.
///
/// # Inputs
/// - `pose`: pose at the start of the tick
/// - `station_pos_cm_rb`: station position in the body frame
/// - `steer_deg`: steer angle, positive turns the wheel right. Angles within
///   `min_steer_angle_deg` of straight ahead or straight behind drive the
///   station in a straight line.
/// - `drive_duty`: signed drive duty of the station's side
/// - `dt_s`: tick length
pub fn calc_candidate(
    params: &Params,
    pose: &Pose,
    station_pos_cm_rb: Vector2<f64>,
    steer_deg: f64,
    drive_duty: i32,
    dt_s: f64,
) -> StationCandidate {
    let speed_cm_s = drive_duty as f64 / 100.0 * params.full_speed_cm_s;
    let dist_cm = speed_cm_s * dt_s;

    let steer_rad = steer_deg.to_radians();

    // The radius diverges wherever the wheel is near parallel to the
    // centreline, pointing forward or backward
    if steer_rad.sin().abs() < params.min_steer_angle_deg.to_radians().sin() {
        let along_cm = dist_cm * steer_rad.cos().signum();
        let pos = pose.position_cm() + pose.forward() * along_cm;

        return StationCandidate {
            pose: Pose::new(pos[0], pos[1], pose.heading_degrees),
            straight: true,
        };
    }

    // Signed radius from the wheel to the fixed axle line, positive when
    // the centre of the turn is to the right
    let radius_cm = station_pos_cm_rb[1] / steer_rad.sin();

    let heading_change_deg = dist_cm / (2.0 * PI * radius_cm) * 360.0;

    let centre_cm_rb = Vector2::new(
        station_pos_cm_rb[0] + radius_cm * steer_rad.cos(),
        0.0,
    );
    let centre_cm = pose.position_cm() + pose.body_to_world() * centre_cm_rb;

    // Positive heading changes are clockwise
    let rot = Rotation2::new(-heading_change_deg.to_radians());
    let pos = centre_cm + rot * (pose.position_cm() - centre_cm);

    StationCandidate {
        pose: Pose::new(
            pos[0], pos[1], pose.heading_degrees + heading_change_deg
        ),
        straight: false,
    }
}

/// Blend station candidates into a single pose.
///
/// Returns `None` if there are no candidates.
pub fn blend_candidates(
    candidates: &[StationCandidate],
    policy: HeadingMean,
) -> Option<Pose> {
    let xs: Vec<f64> = candidates.iter().map(|c| c.pose.x).collect();
    let ys: Vec<f64> = candidates.iter().map(|c| c.pose.y).collect();
    let headings: Vec<f64> = candidates.iter()
        .map(|c| c.pose.heading_degrees)
        .collect();

    Some(Pose::new(
        mean(&xs)?,
        mean(&ys)?,
        blend_headings(&headings, policy)?,
    ))
}

/// Average a set of headings according to `policy`.
///
/// The circular mean is taken of each heading's offset from the arithmetic
/// mean, and then added back onto it. This keeps whole turns made during a
/// tick on the unbounded heading while still treating headings either side of
/// the 0/360 boundary as neighbours.
pub fn blend_headings(
    headings_deg: &[f64],
    policy: HeadingMean,
) -> Option<f64> {
    let arith_deg = mean(headings_deg)?;

    match policy {
        HeadingMean::Arithmetic => Some(arith_deg),
        HeadingMean::Circular => {
            let offsets_deg: Vec<f64> = headings_deg.iter()
                .map(|h| h - arith_deg)
                .collect();

            match circular_mean_deg(&offsets_deg) {
                Some(c) => Some(arith_deg + c),
                None => Some(arith_deg),
            }
        }
    }
}
