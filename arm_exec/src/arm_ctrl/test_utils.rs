//! Shared helpers for the arm control tests

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::Params;
use comms_if::eqpt::joint::{JointStateBatch, RawJointSample};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Raw tilt position of the stowed pose (180 degrees with a 90 degree
/// offset)
pub(crate) const STOW_TILT_RAD: f64 = std::f64::consts::FRAC_PI_2;

/// Raw tilt position of the deployed pose (0 degrees with a 90 degree
/// offset)
pub(crate) const DEPLOY_TILT_RAD: f64 = -std::f64::consts::FRAC_PI_2;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Parameters used by the arm control tests.
pub(crate) fn test_params() -> Params {
    Params {
        pan_joint_name: "arm_pan_motor".into(),
        tilt_joint_name: "arm_tilt_motor".into(),
        gripper_joint_name: "arm_gripper_motor".into(),
        tol_pan_deg: 1.0,
        tol_tilt_deg: 1.0,
        tol_gripper_pct: 2.0,
        timeout_goal_s: 60.0,
        timeout_watchdog_s: 60.0,
    }
}

/// Build a joint state batch from `(name, raw position)` pairs.
pub(crate) fn batch(samples: &[(&str, f64)]) -> JointStateBatch {
    JointStateBatch {
        timestamp: chrono::Utc::now(),
        samples: samples
            .iter()
            .map(|(name, pos)| RawJointSample {
                name: name.to_string(),
                pos: *pos,
                vel: 0.0,
                effort: 0.0,
            })
            .collect(),
    }
}
