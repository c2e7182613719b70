//! Parameters for the arm exec

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Exec-level parameters, mostly network endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmExecParams {
    /// Endpoint the telecommand server listens on.
    pub tc_endpoint: String,

    /// Endpoint joint demands are published on.
    pub joint_dems_endpoint: String,

    /// Endpoint raw joint states are received on.
    pub joint_states_endpoint: String,

    /// Endpoint telemetry is published on.
    pub tm_endpoint: String,
}
