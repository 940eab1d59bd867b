//! # Script player
//!
//! Replays a command script into a simulation alongside the network path.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use log::{debug, info};

// Internal
use util::script_interpreter::{PendingCmds, ScriptInterpreter};
use crate::sim_state::SimHandle;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// How often the script is checked for due commands.
const POLL_PERIOD: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply every command due at `script_time_s`.
///
/// Returns false once the script has finished.
pub fn play_pending(
    sim: &SimHandle,
    si: &mut ScriptInterpreter,
    script_time_s: f64,
) -> bool {
    match si.get_pending_cmds(script_time_s) {
        PendingCmds::None => true,
        PendingCmds::Some(cmds) => {
            for cmd in cmds.iter() {
                let report = sim.apply_command(cmd);
                debug!(
                    "Script command at {:.2} s: {} applied, {} discarded",
                    script_time_s, report.num_applied, report.num_discarded
                );
            }
            true
        }
        PendingCmds::EndOfScript => false,
    }
}

/// Play a script on a background thread, starting now.
///
/// `on_end` is called when the script finishes. Clearing `run` abandons the
/// script without calling `on_end`.
pub fn spawn<F>(
    sim: SimHandle,
    mut si: ScriptInterpreter,
    run: Arc<AtomicBool>,
    on_end: F,
) -> std::io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name("script_player".into())
        .spawn(move || {
            let start = Instant::now();

            while run.load(Ordering::Relaxed) {
                let script_time_s = start.elapsed().as_secs_f64();

                if !play_pending(&sim, &mut si, script_time_s) {
                    info!("End of command script reached");
                    on_end();
                    return;
                }

                thread::sleep(POLL_PERIOD);
            }
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc;

    const SCRIPT: &str = r#"
        0.0: { "servos": { "0": 30 } };
        0.5: { "wheelMotors": { "l": [40, 0], "r": [40, 0] } };
        1.0: { "wheelMotors": { "l": [0, 0], "r": [0, 0] } };
    "#;

    #[test]
    fn test_play_pending() {
        let sim = SimHandle::new();
        let mut si = ScriptInterpreter::from_script_str(SCRIPT).unwrap();

        assert!(play_pending(&sim, &mut si, 0.0));
        assert_eq!(sim.actuators().servos_deg[0], 30.0);
        assert_eq!(sim.actuators().drive.speed_left, 0);

        assert!(play_pending(&sim, &mut si, 0.6));
        assert_eq!(sim.actuators().drive.speed_left, 40);

        assert!(play_pending(&sim, &mut si, 2.0));
        assert_eq!(sim.actuators().drive.speed_left, 0);

        assert!(!play_pending(&sim, &mut si, 2.1));
    }

    #[test]
    fn test_spawned_player_ends() {
        let sim = SimHandle::new();
        let si = ScriptInterpreter::from_script_str(
            "0.0: { \"servos\": { \"5\": -5 } };"
        ).unwrap();
        let (tx, rx) = mpsc::channel();

        let jh = spawn(
            sim.clone(),
            si,
            Arc::new(AtomicBool::new(true)),
            move || { tx.send(()).ok(); },
        ).unwrap();

        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        jh.join().unwrap();
        assert_eq!(sim.actuators().servos_deg[5], -5.0);
    }
}
