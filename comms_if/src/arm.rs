//! # Arm behaviour interface
//!
//! This module defines the states, results and feedback structures which the
//! arm behaviour exec publishes to the outside world.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The full state of the arm behaviour state machine.
///
/// `Unknown`, `Stowed` and `Deployed` are the resting states between actions.
/// The remaining states (other than `Initializing`) each wait on a single
/// joint sub-action to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmState {
    /// Waiting for the first joint feedback from the driver
    Initializing,
    /// Feedback received but the arm pose has not been classified yet
    Unknown,
    /// The arm is in the stowed pose
    Stowed,
    /// The arm is deployed and ready for motion
    Deployed,
    /// A move action is waiting on the pan joint
    Panning,
    /// A move action is waiting on the tilt joint
    Tilting,
    /// A gripper action is waiting on the gripper joint
    Setting,
    /// A gripper calibration is in progress
    Calibrating,
    /// A stow action is closing the gripper
    StowingSetting,
    /// A stow action is waiting on the pan joint
    StowingPanning,
    /// A stow action is waiting on the tilt joint
    StowingTilting,
    /// A deploy action is waiting on the pan joint
    DeployingPanning,
    /// A deploy action is waiting on the tilt joint
    DeployingTilting,
}

/// Simplified gripper state for external visualisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GripperState {
    Uncalibrated,
    Closed,
    Open,
    Calibrating,
}

/// Simplified joint motion state for external visualisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArmJointState {
    Unknown,
    Deploying,
    Stopped,
    Moving,
    Stowing,
    Stowed,
}

/// The outcome code reported to the commander when an arm action concludes.
///
/// Positive values indicate success, negative values an aborted or failed
/// action, and zero a preempted/cancelled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ResultCode {
    Success = 1,
    PanFailed = -1,
    TiltFailed = -2,
    GripperFailed = -3,
    CalibrateFailed = -4,
    BadPanValue = -5,
    BadTiltValue = -6,
    BadGripperValue = -7,
    CollisionAvoided = -8,
    NeedToCalibrate = -9,
    InvalidCommand = -10,
    NotAllowed = -11,
    CommunicationError = -12,
}

/// Classification of a result code, determining which outcome channel is
/// used when reporting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    Succeeded,
    Aborted,
    Preempted,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The terminal result of an arm action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArmResult {
    /// The outcome code of the action
    pub response: ResultCode,

    /// The outcome channel the response is delivered on
    pub outcome: ActionOutcome,
}

/// A feedback snapshot streamed to the commander while an action is active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArmFeedback {
    /// State of the arm behaviour state machine
    pub state: ArmState,

    /// Current pan position in degrees
    pub pan_deg: f64,

    /// Current tilt position in degrees
    pub tilt_deg: f64,

    /// Current gripper opening in percent
    pub gripper_pct: f64,
}

/// Notification of an arm state change, published on every transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StateNotice {
    /// The new full state of the state machine
    pub state: ArmState,

    /// The derived simplified gripper state
    pub gripper_state: GripperState,

    /// The derived simplified joint motion state
    pub joint_state: ArmJointState,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmState {
    /// Returns true if the state is waiting on a joint sub-action, i.e. an
    /// action is in flight and a terminal result is owed to the commander.
    pub fn is_active_action(&self) -> bool {
        matches!(
            self,
            ArmState::Panning
                | ArmState::Tilting
                | ArmState::Setting
                | ArmState::Calibrating
                | ArmState::StowingSetting
                | ArmState::StowingPanning
                | ArmState::StowingTilting
                | ArmState::DeployingPanning
                | ArmState::DeployingTilting
        )
    }

    /// Returns true if the state is a resting state between actions.
    pub fn is_quiescent(&self) -> bool {
        matches!(
            self,
            ArmState::Unknown | ArmState::Stowed | ArmState::Deployed
        )
    }
}

impl Default for ArmState {
    fn default() -> Self {
        ArmState::Initializing
    }
}

impl Default for GripperState {
    fn default() -> Self {
        GripperState::Uncalibrated
    }
}

impl Default for ArmJointState {
    fn default() -> Self {
        ArmJointState::Unknown
    }
}

impl ResultCode {
    /// The signed value of the code, following the sign convention above.
    pub fn value(&self) -> i32 {
        *self as i32
    }

    /// Classify this code into the outcome channel it is delivered on.
    pub fn outcome(&self) -> ActionOutcome {
        match self.value() {
            v if v > 0 => ActionOutcome::Succeeded,
            0 => ActionOutcome::Preempted,
            _ => ActionOutcome::Aborted,
        }
    }
}

impl ArmResult {
    pub fn new(response: ResultCode) -> Self {
        Self {
            response,
            outcome: response.outcome(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_result_code_signs() {
        assert!(ResultCode::Success.value() > 0);
        assert_eq!(ResultCode::Success.outcome(), ActionOutcome::Succeeded);

        for code in [
            ResultCode::PanFailed,
            ResultCode::TiltFailed,
            ResultCode::GripperFailed,
            ResultCode::CalibrateFailed,
            ResultCode::BadPanValue,
            ResultCode::BadTiltValue,
            ResultCode::BadGripperValue,
            ResultCode::CollisionAvoided,
            ResultCode::NeedToCalibrate,
            ResultCode::InvalidCommand,
            ResultCode::NotAllowed,
            ResultCode::CommunicationError,
        ]
        .iter()
        {
            assert!(code.value() < 0, "{:?} should be negative", code);
            assert_eq!(code.outcome(), ActionOutcome::Aborted);
        }
    }

    #[test]
    fn test_active_action_states() {
        assert!(!ArmState::Initializing.is_active_action());
        assert!(!ArmState::Unknown.is_active_action());
        assert!(!ArmState::Stowed.is_active_action());
        assert!(!ArmState::Deployed.is_active_action());
        assert!(ArmState::Panning.is_active_action());
        assert!(ArmState::StowingSetting.is_active_action());
        assert!(ArmState::DeployingTilting.is_active_action());
    }
}
