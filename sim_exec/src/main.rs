//! Rover simulator executable entry point.
//!
//! # Architecture
//!
//! The simulator runs three independent activities on one shared simulation:
//!
//!     - The simulation clock thread, advancing the pose every tick
//!     - The HTTP server, applying posted commands and serving snapshots
//!     - Optionally a script player, replaying a command script
//!
//! Poses are archived by a separate writer thread so that ticks never wait
//! on the filesystem. On Ctrl-C (or when the script ends) the server drains,
//! the clock stops and the final state is saved to the session directory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Receiver},
    Arc,
};
use std::thread::{self, JoinHandle};
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use structopt::StructOpt;
use tokio::sync::Notify;

// Internal
use comms_if::net::NetParams;
use sim_lib::{
    kinematics::KinematicsEngine,
    loc::PoseRecord,
    params::SimExecParams,
    script_player,
    sim_clock::SimulationClock,
    sim_server::{self, ServerState},
    sim_state::SimHandle,
    telemetry::TelemetryResponder,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::ScriptInterpreter,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulates a four-wheel-steered rover driven over HTTP.
#[derive(Debug, StructOpt)]
#[structopt(name = "sim_exec")]
struct Opts {
    /// Command script to replay into the simulation
    #[structopt(short, long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Address to serve on, overriding `net.toml`
    #[structopt(short, long)]
    bind: Option<SocketAddr>,

    /// Simulation tick period in seconds, overriding `sim_exec.toml`
    #[structopt(short, long)]
    tick_period: Option<f64>,

    /// Minimum log level (trace, debug or info)
    #[structopt(short, long, default_value = "debug")]
    log_level: LevelFilter,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new("sim_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    logger_init(opts.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Rover Simulator Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams = util::params::load("net.toml")
        .wrap_err("Could not load net params")?;
    let mut exec_params: SimExecParams = util::params::load("sim_exec.toml")
        .wrap_err("Could not load exec params")?;

    if let Some(p) = opts.tick_period {
        exec_params.tick_period_s = p;
    }

    let addr = match opts.bind {
        Some(a) => a,
        None => net_params.sim_addr()
            .wrap_err("Invalid simulator endpoint")?,
    };

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut engine = KinematicsEngine::default();
    engine.init("kinematics.toml", &session)
        .wrap_err("Failed to initialise the kinematics engine")?;
    info!("Kinematics init complete");

    let script = match opts.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path)
                .wrap_err("Failed to load script")?;
            info!(
                "Loaded script lasts {:.02} s and contains {} commands",
                si.get_duration(),
                si.get_num_cmds()
            );

            Some(si)
        }
        None => None,
    };

    info!("Module initialisation complete\n");

    // ---- START SIMULATION ----

    let sim = SimHandle::new();

    let (pose_sender, arch_jh) = if exec_params.archive_pose {
        let archiver = Archiver::from_path(&session, "pose.csv")
            .wrap_err("Failed to create the pose archive")?;
        let (tx, rx) = mpsc::channel();

        (Some(tx), Some(spawn_archive_thread(archiver, rx)?))
    }
    else {
        (None, None)
    };

    let clock = SimulationClock::start(
        sim.clone(),
        engine,
        exec_params.tick_period_s,
        pose_sender,
    ).wrap_err("Failed to start the simulation clock")?;

    let shutdown = Arc::new(Notify::new());
    let script_run = Arc::new(AtomicBool::new(true));

    let script_jh = match script {
        Some(si) => {
            let shutdown = shutdown.clone();
            Some(script_player::spawn(
                sim.clone(),
                si,
                script_run.clone(),
                move || shutdown.notify_one(),
            ).wrap_err("Failed to start the script player")?)
        }
        None => None,
    };

    // ---- SERVE ----

    let state = ServerState {
        sim: sim.clone(),
        responder: TelemetryResponder::new(&exec_params.sensors),
    };
    let router = sim_server::router(state, &net_params);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("Failed to start the async runtime")?;

    let serve_result = runtime.block_on(async {
        let listener = sim_server::bind(addr).await?;

        sim_server::serve(listener, router, async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if let Err(e) = res {
                        warn!("Could not listen for Ctrl-C: {}", e);
                    }
                    info!("Ctrl-C received, stopping");
                }
                _ = shutdown.notified() => (),
            }
        }).await
    });

    // ---- SHUTDOWN ----

    script_run.store(false, Ordering::Relaxed);
    if let Some(jh) = script_jh {
        if jh.join().is_err() {
            warn!("Script player panicked");
        }
    }

    // Stopping the clock drops its pose sender, ending the archive thread
    clock.stop();
    if let Some(jh) = arch_jh {
        if jh.join().is_err() {
            warn!("Pose archive thread panicked");
        }
    }

    let final_state = sim.snapshot();
    info!(
        "Final pose: ({:.2}, {:.2}) cm, heading {:.2} deg after {} ticks",
        final_state.pose.x,
        final_state.pose.y,
        final_state.pose.heading_degrees,
        final_state.num_ticks
    );
    session.save("final_state.json", final_state);

    session.exit();

    serve_result.wrap_err("Simulator server failed")?;

    info!("End of execution");

    Ok(())
}

/// Write every pose received on `rx` into the archive until the sender is
/// dropped.
fn spawn_archive_thread(
    mut archiver: Archiver,
    rx: Receiver<PoseRecord>,
) -> Result<JoinHandle<()>, Report> {
    thread::Builder::new()
        .name("pose_archive".into())
        .spawn(move || {
            for rec in rx.iter() {
                if let Err(e) = archiver.serialise(rec) {
                    warn!("Could not archive pose, archiving stopped: {}", e);
                    return;
                }
            }

            info!("Archived {} poses", archiver.num_records());
        })
        .wrap_err("Failed to start the pose archive thread")
}
