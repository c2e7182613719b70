//! # Arm control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A goal command that can be completed by the arm behaviour exec.
///
/// Pan and tilt angles are given in degrees, gripper openings in percent
/// (0 is fully closed, 100 fully open).
#[derive(Debug, Clone, Serialize, Deserialize, StructOpt)]
pub enum ArmCmd {
    /// Stop the arm, freezing all joint goals at their current positions.
    #[structopt(name = "stop")]
    Stop,

    /// Deploy the arm from the stowed pose.
    #[structopt(name = "deploy")]
    Deploy,

    /// Stow the arm, closing the gripper first if it is open.
    #[structopt(name = "stow")]
    Stow,

    /// Pan the arm to the given angle, keeping the current tilt goal.
    #[structopt(name = "pan")]
    Pan {
        /// The pan angle to move to in degrees.
        #[structopt(allow_hyphen_values = true)]
        pan_deg: f64,
    },

    /// Tilt the arm to the given angle, keeping the current pan goal.
    #[structopt(name = "tilt")]
    Tilt {
        /// The tilt angle to move to in degrees.
        #[structopt(allow_hyphen_values = true)]
        tilt_deg: f64,
    },

    /// Move the arm to the given pan and tilt angles.
    #[structopt(name = "move")]
    Move {
        /// The pan angle to move to in degrees.
        #[structopt(allow_hyphen_values = true)]
        pan_deg: f64,

        /// The tilt angle to move to in degrees.
        #[structopt(allow_hyphen_values = true)]
        tilt_deg: f64,
    },

    /// Set the gripper opening to the given percentage.
    #[structopt(name = "grip-set")]
    GripperSet {
        /// The gripper opening in percent, between 0 (closed) and 100 (open).
        percent: f64,
    },

    /// Fully open the gripper.
    #[structopt(name = "grip-open")]
    GripperOpen,

    /// Fully close the gripper.
    #[structopt(name = "grip-close")]
    GripperClose,

    /// Calibrate the gripper. Must be performed before any gripper motion.
    #[structopt(name = "grip-cal")]
    GripperCalibrate,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// New joint tolerances requested with the `ArmSetTolerances` TC.
///
/// Only accepted while the arm is in a resting state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, StructOpt)]
pub struct ArmTolerances {
    /// Tolerance on the pan angle in degrees
    pub tol_pan_deg: f64,

    /// Tolerance on the tilt angle in degrees
    pub tol_tilt_deg: f64,

    /// Tolerance on the gripper opening in percent
    pub tol_gripper_pct: f64,
}
