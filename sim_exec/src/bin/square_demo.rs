//! # Square demo
//!
//! Drives the simulated rover around a square through the rover API, with
//! the simulation running in process. Each side is driven with the wheels
//! straight and each corner is a point turn, after which the pose is logged.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::thread;
use std::time::Duration;
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::info;
use structopt::StructOpt;

// Internal
use sim_lib::{
    geometry::STATIONS,
    kinematics::{KinematicsEngine, Params},
    params::SimExecParams,
    rover_api::{self, Rover, DEFAULT_BRIGHTNESS},
    sim_clock::SimulationClock,
    sim_state::SimHandle,
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Drives the simulated rover around a square.
#[derive(Debug, StructOpt)]
#[structopt(name = "square_demo")]
struct Opts {
    /// Length of each side of the square in centimeters
    #[structopt(long, default_value = "30")]
    side_cm: f64,

    /// Drive speed from 1 to 100
    #[structopt(long, default_value = "100")]
    speed: f64,

    /// Minimum log level (trace, debug or info)
    #[structopt(short, long, default_value = "info")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    if !(opts.speed > 0.0 && opts.speed <= 100.0) {
        return Err(eyre!("Speed must be in (0, 100], got {}", opts.speed));
    }

    let session = Session::new("square_demo", "sessions")
        .wrap_err("Failed to create the session")?;
    logger_init(opts.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Square Demo\n");

    let exec_params: SimExecParams = util::params::load("sim_exec.toml")
        .wrap_err("Could not load exec params")?;

    let mut engine = KinematicsEngine::default();
    engine.init("kinematics.toml", &session)
        .wrap_err("Failed to initialise the kinematics engine")?;
    let params = *engine.params();

    // ---- TIMINGS ----

    let speed_cm_s = opts.speed / 100.0 * params.full_speed_cm_s;
    let side_time = Duration::from_secs_f64(opts.side_cm / speed_cm_s);

    let turn_rate_deg_s = (speed_cm_s / params.geometry.station_radius_cm())
        .to_degrees();
    let corner_time = Duration::from_secs_f64(90.0 / turn_rate_deg_s);

    info!(
        "Each side takes {:.2} s, each corner {:.2} s",
        side_time.as_secs_f64(),
        corner_time.as_secs_f64()
    );

    // ---- DRIVE ----

    let sim = SimHandle::new();
    let clock = SimulationClock::start(
        sim.clone(),
        engine,
        exec_params.tick_period_s,
        None,
    ).wrap_err("Failed to start the simulation clock")?;

    let mut rover = Rover::new(sim.clone(), exec_params.sensors);
    rover.init(DEFAULT_BRIGHTNESS);

    for leg in 0..4 {
        rover.set_color(rover_api::wheel((leg * 64) as u8));
        rover.show();

        set_steering(&mut rover, &params, false);
        rover.forward(opts.speed);
        thread::sleep(side_time);
        rover.stop();

        set_steering(&mut rover, &params, true);
        rover.spin_right(opts.speed);
        thread::sleep(corner_time);
        rover.stop();

        let pose = sim.pose();
        info!(
            "Leg {}: ({:.2}, {:.2}) cm, heading {:.2} deg",
            leg + 1,
            pose.x,
            pose.y,
            pose.heading_degrees
        );
    }

    rover.cleanup();
    clock.stop();

    let final_state = sim.snapshot();
    info!(
        "Finished {:.2} cm from the start after {} ticks",
        final_state.pose.position_cm().norm(),
        final_state.num_ticks
    );
    session.save("final_state.json", final_state);

    session.exit();

    info!("End of execution");

    Ok(())
}

/// Point every station straight ahead, or at its point turn angle.
fn set_steering(rover: &mut Rover, params: &Params, point_turn: bool) {
    for station in STATIONS.iter() {
        let angle_deg = if point_turn {
            params.geometry.point_turn_steer_deg(*station)
        }
        else {
            0.0
        };

        rover.set_servo(params.steering.channel(*station), angle_deg);
    }
}
