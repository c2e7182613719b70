//! Goal arbiter
//!
//! The arbiter validates incoming arm commands against the current state and
//! the arm's capabilities, translating accepted commands into joint goals
//! and state machine events. Rejected commands produce an immediate aborted
//! result and never change the state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use super::fsm::{ArmFsm, Event, FsmContext};
use super::{
    JointType, GRIPPER_CAL, GRIPPER_CLOSE_PCT, GRIPPER_DEPLOY_PCT, GRIPPER_OPEN_PCT,
    GRIPPER_STOW_PCT, PAN_COLLISION_MARGIN_DEG, PAN_DEPLOY_DEG, PAN_MAX_DEG, PAN_MIN_DEG,
    PAN_STOW_DEG, TILT_DEPLOY_DEG, TILT_MAX_DEG, TILT_MIN_DEG, TILT_SAFE_DEG, TILT_STOW_DEG,
};
use comms_if::arm::{ArmState, ResultCode};
use comms_if::tc::arm_ctrl::ArmCmd;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Arbitrate a new arm command.
///
/// A new goal command arriving while an action is in flight preempts the
/// running action before being processed itself.
pub(crate) fn arbitrate(cmd: &ArmCmd, fsm: &mut ArmFsm, ctx: &mut FsmContext) {
    debug!("Received a new {:?} command", cmd);

    // A new goal preempts any in-flight action. Stop is excluded since
    // cancellation is its entire job.
    if fsm.state().is_active_action() && !matches!(cmd, ArmCmd::Stop) {
        fsm.update(Event::GoalCancel, ctx);
    }

    match cmd {
        // Stop the arm
        ArmCmd::Stop => {
            ctx.registry.snap_goals_to_current();
            fsm.update(Event::GoalCancel, ctx);
        }

        // Deploy the arm
        ArmCmd::Deploy => {
            if fsm.state() == ArmState::Stowed {
                ctx.registry.set_goal(JointType::Pan, PAN_DEPLOY_DEG);
                ctx.registry.set_goal(JointType::Tilt, TILT_DEPLOY_DEG);
                ctx.registry.set_goal(JointType::Gripper, GRIPPER_DEPLOY_PCT);
                fsm.update(Event::GoalDeploy, ctx);
            } else {
                ctx.reject(ResultCode::NotAllowed);
            }
        }

        // Stow the arm
        ArmCmd::Stow => {
            if fsm.state() == ArmState::Deployed {
                ctx.registry.set_goal(JointType::Pan, PAN_STOW_DEG);
                ctx.registry.set_goal(JointType::Tilt, TILT_STOW_DEG);
                ctx.registry.set_goal(JointType::Gripper, GRIPPER_STOW_PCT);
                fsm.update(Event::GoalStow, ctx);
            } else {
                ctx.reject(ResultCode::NotAllowed);
            }
        }

        // Move the arm, either a single axis or both
        ArmCmd::Pan { .. } | ArmCmd::Tilt { .. } | ArmCmd::Move { .. } => {
            if fsm.state() != ArmState::Stowed && fsm.state() != ArmState::Deployed {
                ctx.reject(ResultCode::NotAllowed);
                return;
            }

            // Get the new proposed pan and tilt values, falling back to the
            // current goal for an unspecified axis
            let new_p = match cmd {
                ArmCmd::Pan { pan_deg } | ArmCmd::Move { pan_deg, .. } => *pan_deg,
                _ => ctx.registry.goal(JointType::Pan),
            };
            let new_t = match cmd {
                ArmCmd::Tilt { tilt_deg } | ArmCmd::Move { tilt_deg, .. } => *tilt_deg,
                _ => ctx.registry.goal(JointType::Tilt),
            };

            // Simple bounds and self-collision checking
            if new_t < TILT_MIN_DEG || new_t > TILT_MAX_DEG {
                ctx.reject(ResultCode::BadTiltValue);
                return;
            }
            if new_p < PAN_MIN_DEG || new_p > PAN_MAX_DEG {
                ctx.reject(ResultCode::BadPanValue);
                return;
            }
            // A high tilt angle with the pan away from the stow position
            // would drive the gripper into the stowed arm housing
            if new_t > TILT_SAFE_DEG && (new_p - PAN_STOW_DEG).abs() > PAN_COLLISION_MARGIN_DEG {
                ctx.reject(ResultCode::CollisionAvoided);
                return;
            }

            // Set the new goals and start the action
            ctx.registry.set_goal(JointType::Pan, new_p);
            ctx.registry.set_goal(JointType::Tilt, new_t);
            fsm.update(Event::GoalMove, ctx);
        }

        // Calibrate the gripper
        ArmCmd::GripperCalibrate => {
            if fsm.state() == ArmState::Deployed {
                ctx.registry.set_goal(JointType::Gripper, GRIPPER_CAL);
                fsm.update(Event::GoalCalibrate, ctx);
            } else {
                ctx.reject(ResultCode::NotAllowed);
            }
        }

        // Set the gripper opening
        ArmCmd::GripperSet { percent } => {
            if ctx.registry.value(JointType::Gripper) < 0.0 {
                ctx.reject(ResultCode::NeedToCalibrate);
                return;
            }
            if fsm.state() == ArmState::Deployed {
                // Check that the gripper value is reasonable
                if *percent < GRIPPER_CLOSE_PCT || *percent > GRIPPER_OPEN_PCT {
                    ctx.reject(ResultCode::BadGripperValue);
                    return;
                }
                ctx.registry.set_goal(JointType::Gripper, *percent);
                fsm.update(Event::GoalSet, ctx);
            } else {
                ctx.reject(ResultCode::NotAllowed);
            }
        }

        // Open the gripper
        ArmCmd::GripperOpen => {
            if ctx.registry.value(JointType::Gripper) < 0.0 {
                ctx.reject(ResultCode::NeedToCalibrate);
                return;
            }
            if fsm.state() == ArmState::Deployed {
                ctx.registry.set_goal(JointType::Gripper, GRIPPER_OPEN_PCT);
                fsm.update(Event::GoalSet, ctx);
            } else {
                ctx.reject(ResultCode::NotAllowed);
            }
        }

        // Close the gripper
        ArmCmd::GripperClose => {
            if ctx.registry.value(JointType::Gripper) < 0.0 {
                ctx.reject(ResultCode::NeedToCalibrate);
                return;
            }
            if fsm.state() == ArmState::Deployed {
                ctx.registry.set_goal(JointType::Gripper, GRIPPER_CLOSE_PCT);
                fsm.update(Event::GoalSet, ctx);
            } else {
                ctx.reject(ResultCode::NotAllowed);
            }
        }
    }
}
