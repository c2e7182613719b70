//! # Arm control module
//!
//! This module implements the arm behaviour state machine, which converts
//! high level arm goals (deploy, stow, move, gripper actions) into individual
//! joint commands for the low-level joint driver, and tracks joint feedback
//! to detect completion of each action.
//!
//! The module is broken down into:
//!
//! - `joints` - per-joint calibration data and unit conversion
//! - `fsm` - the state machine and its transition table
//! - `arbiter` - validation and translation of incoming goal commands
//! - `actuation` - issuing of joint demands and goal/watchdog timers
//! - `telemetry` - ingestion of raw joint state feedback
//! - `state` - the [`ArmCtrl`] module state tying the above together

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod actuation;
mod arbiter;
mod fsm;
mod joints;
mod params;
mod state;
mod telemetry;

#[cfg(test)]
pub(crate) mod test_utils;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use actuation::*;
pub use fsm::*;
pub use joints::*;
pub use params::*;
pub use state::*;
pub use telemetry::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

// Pan joint capabilities and poses.
//
// Units: degrees (human form). The driver works in radians for pan and tilt.

/// DRIVER -> HUMAN offset for the pan joint
pub const PAN_OFFSET_DEG: f64 = 0.0;

/// Minimum commandable pan angle
pub const PAN_MIN_DEG: f64 = -90.0;

/// Maximum commandable pan angle
pub const PAN_MAX_DEG: f64 = 90.0;

/// Pan angle of the stowed pose
pub const PAN_STOW_DEG: f64 = 0.0;

/// Pan angle of the deployed pose
pub const PAN_DEPLOY_DEG: f64 = 0.0;

// Tilt joint capabilities and poses.

/// DRIVER -> HUMAN offset for the tilt joint
pub const TILT_OFFSET_DEG: f64 = 90.0;

/// Minimum commandable tilt angle
pub const TILT_MIN_DEG: f64 = -20.0;

/// Maximum commandable tilt angle
pub const TILT_MAX_DEG: f64 = 180.0;

/// Tilt angle of the stowed pose
pub const TILT_STOW_DEG: f64 = 180.0;

/// Tilt angle of the deployed pose
pub const TILT_DEPLOY_DEG: f64 = 0.0;

/// Maximum tilt angle which cannot collide with the stowed arm housing,
/// regardless of pan angle.
pub const TILT_SAFE_DEG: f64 = 90.0;

/// Maximum deviation of pan from the stow position which is still collision
/// safe when the tilt angle exceeds [`TILT_SAFE_DEG`].
pub const PAN_COLLISION_MARGIN_DEG: f64 = 0.1;

// Gripper capabilities and poses.
//
// Units: percent open (human form), 0 is fully closed and 100 fully open.
// The driver works in millimetres of jaw opening.

/// Fully closed gripper opening
pub const GRIPPER_CLOSE_PCT: f64 = 0.0;

/// Fully open gripper opening
pub const GRIPPER_OPEN_PCT: f64 = 100.0;

/// Gripper opening of the stowed pose
pub const GRIPPER_STOW_PCT: f64 = 0.0;

/// Gripper opening of the deployed pose
pub const GRIPPER_DEPLOY_PCT: f64 = 0.0;

/// Gripper calibration sentinel.
///
/// The driver reports this raw value while the gripper position is unknown,
/// and a demand of this value triggers a calibration run. Any gripper value
/// below zero means "uncalibrated".
pub const GRIPPER_CAL: f64 = -100.0;

/// DRIVER -> HUMAN scale for the gripper (driver range 0 to 25 mm maps to
/// 0 to 100 percent open)
pub const GRIPPER_SCALE_PCT: f64 = 4.0;

/// DRIVER -> HUMAN offset for the gripper
pub const GRIPPER_OFFSET_PCT: f64 = 0.0;

/// DRIVER -> HUMAN scale for pan and tilt (radians to degrees)
pub const RADS_TO_DEGS: f64 = 180.0 / std::f64::consts::PI;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Failed to load ArmCtrl params: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid joint configuration: {0}")]
    InvalidJointConfig(String),
}
