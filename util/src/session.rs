//! # Session management
//!
//! A session is one run of an executable. Each session gets its own
//! timestamped directory under the sessions root:
//!
//! ```text
//! sessions/
//!     sim_exec_20201012_153024/
//!         sim_exec.log
//!         final_state.json
//!         arch/
//!             pose.csv
//! ```
//!
//! JSON files are written by a background thread so that callers on the
//! simulation path never wait on the disk.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use erased_serde::Serialize;
use log::{info, warn};
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Time the session was started, shared by every log record.
static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Format of the timestamp in session directory names, see
/// https://docs.rs/chrono/0.4/chrono/format/strftime/index.html
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the archive directory within a session.
const ARCH_DIR: &str = "arch";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Session-relative path and the data to write there.
type SaveRequest = (PathBuf, Box<dyn Serialize + Send>);

/// The directories and background saver of the current session.
pub struct Session {
    /// The root directory for this session
    pub session_root: PathBuf,

    /// The root directory for this session's archives
    pub arch_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,

    /// `None` once the session has exited
    saver: Option<(Sender<SaveRequest>, JoinHandle<()>)>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (ROVER_SIM_ROOT) is \
             not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory {0:?}: {1}")]
    CannotCreateDir(PathBuf, std::io::Error),

    #[error("A session has already been started in this process ({0})")]
    CannotInitEpoch(conquer_once::TryInitError),

    #[error("No session has been started in this process")]
    CannotGetEpoch,

    #[error("Cannot start the session save thread: {0}")]
    CannotStartSaver(std::io::Error),
}

/// Reasons a saved file could not be written.
#[derive(Error, Debug)]
enum SaveError {
    #[error("only .json files can be saved")]
    UnsupportedExtension,

    #[error("{0}")]
    Io(std::io::Error),

    #[error("{0}")]
    Serialise(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start a new session in `$ROVER_SIM_ROOT/{sessions_dir}`.
    ///
    /// The session directory is named `{exec_name}_{timestamp}`. Only one
    /// session may be started per process.
    pub fn new(
        exec_name: &str, sessions_dir: &str
    ) -> Result<Self, SessionError> {
        let root = crate::host::get_sim_root()
            .map_err(|_| SessionError::SwRootNotSet)?;

        Self::new_in(exec_name, root.join(sessions_dir))
    }

    /// Start a new session inside an explicit sessions directory.
    pub fn new_in<P: AsRef<Path>>(
        exec_name: &str, sessions_path: P
    ) -> Result<Self, SessionError> {
        SESSION_EPOCH.try_init_once(Utc::now)
            .map_err(SessionError::CannotInitEpoch)?;
        let epoch = get_epoch()?;

        let session_root = sessions_path.as_ref().join(format!(
            "{}_{}",
            exec_name,
            epoch.format(TIMESTAMP_FORMAT)
        ));
        let arch_root = session_root.join(ARCH_DIR);

        // Creating the archive directory creates the session root too
        fs::create_dir_all(&arch_root)
            .map_err(|e| SessionError::CannotCreateDir(arch_root.clone(), e))?;

        let (tx, rx) = channel();
        let save_root = session_root.clone();
        let jh = thread::Builder::new()
            .name("session_save".into())
            .spawn(move || save_thread(save_root, rx))
            .map_err(SessionError::CannotStartSaver)?;

        Ok(Session {
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            session_root,
            arch_root,
            saver: Some((tx, jh)),
        })
    }

    /// Exit the session, waiting for any queued saves to be written.
    pub fn exit(mut self) {
        if let Some((tx, jh)) = self.saver.take() {
            // The save thread drains the queue and stops once disconnected
            drop(tx);

            if jh.join().is_err() {
                warn!("Session save thread panicked");
            }
        }

        info!("Session {:?} closed", self.session_root);
    }

    /// Queue `data` to be written as JSON to the session-relative `path`.
    ///
    /// Failures are logged rather than returned, as the write happens on the
    /// save thread.
    pub fn save<P, T>(&self, path: P, data: T)
    where
        P: AsRef<Path>,
        T: Serialize + Send + 'static,
    {
        let path = path.as_ref().to_path_buf();

        match self.saver {
            Some((ref tx, _)) => {
                if let Err(e) = tx.send((path.clone(), Box::new(data))) {
                    warn!("Could not queue {:?} for saving: {}", path, e);
                }
            }
            None => warn!("Cannot save {:?}, the session has exited", path),
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// If the session has not been started yet `NAN` is returned.
pub fn get_elapsed_seconds() -> f64 {
    SESSION_EPOCH.get()
        .and_then(|e| time::duration_to_seconds(Utc::now() - *e))
        .unwrap_or(std::f64::NAN)
}

/// Return a reference to the session's epoch.
pub fn get_epoch() -> Result<&'static DateTime<Utc>, SessionError> {
    SESSION_EPOCH.get().ok_or(SessionError::CannotGetEpoch)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn save_thread(session_root: PathBuf, rx: Receiver<SaveRequest>) {
    for (path, data) in rx.iter() {
        let full_path = session_root.join(&path);

        if let Err(e) = write_json(&full_path, data.as_ref()) {
            warn!("Could not save {:?}: {}", full_path, e);
        }
    }
}

fn write_json(path: &Path, data: &dyn Serialize) -> Result<(), SaveError> {
    if path.extension().and_then(|s| s.to_str()) != Some("json") {
        return Err(SaveError::UnsupportedExtension);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(SaveError::Io)?;
    }

    let file = File::create(path).map_err(SaveError::Io)?;

    serde_json::to_writer_pretty(file, data).map_err(SaveError::Serialise)
}

#[cfg(test)]
mod test {
    use super::*;

    // Only one session can exist per process, so everything is checked in
    // one test.
    #[test]
    fn test_session() {
        let sessions = std::env::temp_dir()
            .join(format!("rover_sim_session_test_{}", std::process::id()));

        let session = Session::new_in("test_exec", &sessions).unwrap();
        assert!(session.arch_root.is_dir());
        assert!(session.arch_root.starts_with(&session.session_root));
        assert!(get_elapsed_seconds() >= 0.0);

        session.save("nested/state.json", vec![1, 2, 3]);
        session.save("state.txt", 1);
        let root = session.session_root.clone();
        session.exit();

        let saved = fs::read_to_string(root.join("nested/state.json"))
            .unwrap();
        let value: Vec<i32> = serde_json::from_str(&saved).unwrap();
        assert_eq!(value, vec![1, 2, 3]);
        assert!(!root.join("state.txt").exists());

        assert!(Session::new_in("test_exec", &sessions).is_err());

        fs::remove_dir_all(&sessions).ok();
    }
}
