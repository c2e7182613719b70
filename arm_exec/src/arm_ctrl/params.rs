//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Params {
    // ---- JOINT NAMES ----
    /// The name of the pan joint used by the low-level driver.
    pub pan_joint_name: String,

    /// The name of the tilt joint used by the low-level driver.
    pub tilt_joint_name: String,

    /// The name of the gripper joint used by the low-level driver.
    pub gripper_joint_name: String,

    // ---- TOLERANCES ----
    /// Maximum deviation of the pan angle from its goal which still counts
    /// as goal reached.
    ///
    /// Units: degrees
    pub tol_pan_deg: f64,

    /// Maximum deviation of the tilt angle from its goal which still counts
    /// as goal reached.
    ///
    /// Units: degrees
    pub tol_tilt_deg: f64,

    /// Maximum deviation of the gripper opening from its goal which still
    /// counts as goal reached.
    ///
    /// Units: percent
    pub tol_gripper_pct: f64,

    // ---- TIMEOUTS ----
    /// Maximum duration allowed for a single joint sub-action to reach its
    /// goal before the action is failed.
    ///
    /// Units: seconds
    pub timeout_goal_s: f64,

    /// Maximum duration without any joint state feedback before the link to
    /// the driver is declared lost.
    ///
    /// Units: seconds
    pub timeout_watchdog_s: f64,
}
