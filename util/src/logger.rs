//! # Logger
//!
//! Records go both to stdout, with coloured levels, and to the session's log
//! file in plain text. Every record is stamped with the seconds elapsed since
//! the session started.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Crates whose debug output would drown the simulator's own logs.
const QUIET_TARGETS: [&str; 3] = ["hyper", "mio", "tokio"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level at least as verbose as `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Notes
///
/// - `min_level` must be at least as verbose as `log::Level::Info`.
/// - Debug and trace records also carry the name of the thread that emitted
///   them, so the tick thread can be told apart from the server.
/// - Only one logger can be set per process, later calls fail.
pub fn logger_init(
    min_level: LevelFilter,
    session: &Session
) -> Result<(), LoggerInitError> {

    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let mut root = fern::Dispatch::new().level(min_level);
    for target in QUIET_TARGETS.iter() {
        root = root.level_for(*target, LevelFilter::Info);
    }

    let stdout = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {}",
                prefix(record, true),
                message
            ))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {}",
                prefix(record, false),
                message
            ))
        })
        .chain(log_file);

    root.chain(stdout)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Ok(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the `[time LVL] thread@target:` prefix of a record. The thread and
/// target are only shown for debug and trace records.
fn prefix(record: &Record, colour: bool) -> String {
    let level = level_to_str(record.level(), colour);
    let elapsed_s = session::get_elapsed_seconds();

    if record.level() > Level::Info {
        format!(
            "[{:10.6} {}] {}@{}:",
            elapsed_s,
            level,
            std::thread::current().name().unwrap_or("?"),
            record.target()
        )
    }
    else {
        format!("[{:10.6} {}]", elapsed_s, level)
    }
}

/// Get the string representation of a log level
fn level_to_str(level: Level, colour: bool) -> ColoredString {
    let s = match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info  => "INF",
        Level::Warn  => "WRN",
        Level::Error => "ERR",
    };

    if !colour {
        return s.clear();
    }

    match level {
        Level::Trace => s.dimmed().italic(),
        Level::Debug => s.dimmed(),
        Level::Info  => s.normal(),
        Level::Warn  => s.yellow(),
        Level::Error => s.red().bold(),
    }
}
