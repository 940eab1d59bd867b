//! Module interfaces
//!
//! Cyclic modules of `sim_exec` (those invoked once per simulation tick)
//! implement the items in this module.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::warn;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The module's internal state.
pub trait State {
    /// Short name of the module, used when logging on its behalf.
    const NAME: &'static str;

    /// Data required during initialisation
    type InitData;
    /// An error which can occur during initialisation.
    type InitError;

    /// Data required for cyclic processing.
    type InputData;
    /// Data produced by cyclic processing.
    type OutputData;
    /// A report on the status of the cyclic processing.
    type StatusReport;
    /// An error which can occur during cyclic processing.
    type ProcError: std::fmt::Display;

    /// Initialise the module.
    ///
    /// # Inputs
    /// - `init_data`: The input data required by the module, usually the
    ///   path to its parameter file.
    /// - `session`: The session the module runs in.
    ///
    /// # Outputs
    /// - On success `Ok(())`.
    /// - On error an `InitError` instance.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Main module processing function.
    ///
    /// # Inputs
    /// - `input_data`: The data required for processing by the module.
    ///
    /// # Outputs
    /// - On success a tuple of the output data and status report.
    /// - On error a `ProcError` instance.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;

    /// Run `proc`, logging and absorbing any error.
    ///
    /// Used by cyclic callers which must keep running whatever one cycle
    /// does. `None` is returned for a failed cycle.
    fn proc_or_warn(&mut self, input_data: &Self::InputData)
        -> Option<(Self::OutputData, Self::StatusReport)>
    {
        match self.proc(input_data) {
            Ok(out) => Some(out),
            Err(e) => {
                warn!("Error during {} processing: {}", Self::NAME, e);
                None
            }
        }
    }
}
