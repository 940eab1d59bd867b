//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Environment variable pointing at the root of the simulator software tree.
///
/// The `params`, `scripts` and `sessions` directories are resolved relative to this root.
pub const SIM_ROOT_ENV_VAR: &str = "ROVER_SIM_ROOT";

/// Get the root directory of the simulator software tree.
pub fn get_sim_root() -> Result<PathBuf, env::VarError> {
    env::var(SIM_ROOT_ENV_VAR).map(PathBuf::from)
}
