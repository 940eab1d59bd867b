//! # Rover command script interpreter module
//!
//! This module provides an interpreter for rover command scripts, allowing
//! command documents to be replayed into the simulator at set times.
//!
//! A script is a sequence of entries of the form `<time_s>: <command>;`,
//! where the command is a JSON command document as accepted by the
//! simulator's HTTP endpoint:
//!
//! ```text
//! 0.0: { "servos": { "9": 0, "11": 0, "13": 0, "15": 0 } };
//! 0.0: { "wheelMotors": { "l": [100, 0], "r": [100, 0] } };
//! 3.0: { "wheelMotors": { "l": [0, 0], "r": [0, 0] } };
//! ```
//!
//! Anything that isn't an entry (comments, blank lines) is ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use conquer_once::Lazy;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

// Internal
use comms_if::eqpt::rover::{SimCommand, CommandParseError};

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Matches one `<time_s>: <command>;` entry, __the magic regex__.
static ENTRY_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
        .multi_line(true)
        .build()
        .expect("Script entry regex is invalid")
});

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
struct ScriptedCmd {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The command to apply
    cmd: SimCommand
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending_cmds` to acquire a list of commands that need applying.
pub struct ScriptInterpreter {
    script_path: Option<PathBuf>,
    cmds: VecDeque<ScriptedCmd>,
    duration_s: f64,
    num_cmds: usize
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script entries must be in time order, found {0} s after {1} s")]
    OutOfOrder(f64, f64),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCmd(f64, CommandParseError)
}

/// Commands pending execution.
#[derive(Debug, PartialEq)]
pub enum PendingCmds {
    None,
    Some(Vec<SimCommand>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::from_script_str(&script)?;
        si.script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script_str(script: &str) -> Result<Self, ScriptError> {

        // Empty queue of commands
        let mut cmd_queue: VecDeque<ScriptedCmd> = VecDeque::new();

        for cap in ENTRY_RE.captures_iter(script) {
            // Both groups are mandatory in the pattern
            let (time_str, cmd_str) = match (cap.get(1), cap.get(3)) {
                (Some(t), Some(c)) => (t.as_str(), c.as_str()),
                _ => continue
            };

            // Parse the exec time
            let exec_time_s: f64 = time_str.parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            if let Some(prev) = cmd_queue.back() {
                if exec_time_s < prev.exec_time_s {
                    return Err(ScriptError::OutOfOrder(exec_time_s, prev.exec_time_s));
                }
            }

            // Parse the command from the payload. The scripts contain JSON only.
            let cmd = SimCommand::from_json(cmd_str)
                .map_err(|e| ScriptError::InvalidCmd(exec_time_s, e))?;

            cmd_queue.push_back(ScriptedCmd {
                exec_time_s,
                cmd
            });
        }

        if cmd_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        let duration_s = cmd_queue.back().map(|c| c.exec_time_s).unwrap_or(0.0);
        let num_cmds = cmd_queue.len();

        Ok(ScriptInterpreter {
            script_path: None,
            cmds: cmd_queue,
            duration_s,
            num_cmds
        })
    }

    /// Return the commands which are due at `current_time_s` (seconds since
    /// the script started) and haven't been returned yet.
    pub fn get_pending_cmds(&mut self, current_time_s: f64) -> PendingCmds {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingCmds::EndOfScript
        }

        let mut cmd_vec: Vec<SimCommand> = vec![];

        // Pop commands from the front of the queue for as long as their exec
        // time has been reached.
        while let Some(front) = self.cmds.front() {
            if front.exec_time_s > current_time_s {
                break;
            }

            if let Some(c) = self.cmds.pop_front() {
                cmd_vec.push(c.cmd);
            }
        }

        if cmd_vec.is_empty() {
            PendingCmds::None
        }
        else {
            PendingCmds::Some(cmd_vec)
        }
    }

    /// Get the number of commands in the script
    pub fn get_num_cmds(&self) -> usize {
        self.num_cmds
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        self.duration_s
    }

    /// Path the script was loaded from, if it came from a file
    pub fn script_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SCRIPT: &str = r#"
        # Drive forward then stop
        0.0: { "servos": { "9": 0, "15": 0 } };
        0.0: {
            "wheelMotors": { "l": [100, 0], "r": [100, 0] }
        };
        2.5: { "wheelMotors": { "l": [0, 0], "r": [0, 0] } };
    "#;

    #[test]
    fn test_parse_script() {
        let si = ScriptInterpreter::from_script_str(SCRIPT).unwrap();
        assert_eq!(si.get_num_cmds(), 3);
        assert_eq!(si.get_duration(), 2.5);
        assert!(si.script_path().is_none());
    }

    #[test]
    fn test_pending_cmds() {
        let mut si = ScriptInterpreter::from_script_str(SCRIPT).unwrap();

        match si.get_pending_cmds(0.0) {
            PendingCmds::Some(cmds) => {
                assert_eq!(cmds.len(), 2);
                assert!(cmds[0].servos.is_some());
                assert!(cmds[1].wheel_motors.is_some());
            },
            p => panic!("Expected two commands, got {:?}", p)
        }

        assert_eq!(si.get_pending_cmds(1.0), PendingCmds::None);

        match si.get_pending_cmds(3.0) {
            PendingCmds::Some(cmds) => assert_eq!(cmds.len(), 1),
            p => panic!("Expected one command, got {:?}", p)
        }

        assert_eq!(si.get_pending_cmds(4.0), PendingCmds::EndOfScript);
    }

    #[test]
    fn test_bad_scripts() {
        assert!(matches!(
            ScriptInterpreter::from_script_str("nothing to see here"),
            Err(ScriptError::ScriptEmpty)
        ));
        assert!(matches!(
            ScriptInterpreter::from_script_str("1.0: { \"servos\": 3 };"),
            Err(ScriptError::InvalidCmd(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::from_script_str("2.0: {};\n1.0: {};"),
            Err(ScriptError::OutOfOrder(_, _))
        ));
        assert!(matches!(
            ScriptInterpreter::new("/no/such/script.rsc"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
