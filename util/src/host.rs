//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "ARM_SW_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the root directory of the arm software installation.
///
/// The root is read from the `ARM_SW_ROOT` environment variable, which must
/// be set before any executable is run.
pub fn get_arm_sw_root() -> Result<PathBuf, env::VarError> {
    Ok(PathBuf::from(env::var(SW_ROOT_ENV_VAR)?))
}
