//! # Communications interface crate.
//!
//! Provides the documents exchanged between the rover simulator and its clients, along with the
//! network parameters used to reach it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command and response definitions for equipment (the simulated rover)
pub mod eqpt;

/// Network module
pub mod net;
