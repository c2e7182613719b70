//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::arm_ctrl;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time
    pub elapsed_time_s: f64,

    // ArmCtrl
    pub arm_ctrl: arm_ctrl::ArmCtrl,
    pub arm_ctrl_input: arm_ctrl::InputData,
    pub arm_ctrl_output: arm_ctrl::ArmCtrlOutput,
    pub arm_ctrl_status_rpt: arm_ctrl::StatusReport,

    // Link monitoring
    /// True if the TC server currently has a commander connected
    pub tc_connected: bool,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.arm_ctrl_input = arm_ctrl::InputData::default();
        self.arm_ctrl_output = arm_ctrl::ArmCtrlOutput::default();
        self.arm_ctrl_status_rpt = arm_ctrl::StatusReport::default();

        self.elapsed_time_s = util::session::get_elapsed_seconds();
    }
}
