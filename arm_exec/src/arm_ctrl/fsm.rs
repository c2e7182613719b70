//! Arm behaviour finite state machine
//!
//! The machine holds exactly one current [`ArmState`] and a deterministic
//! transition table mapping (state, event) pairs onto side effects and next
//! states. Events which have no entry for the current state are ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use super::{ActuationGateway, JointRegistry, JointType, GRIPPER_CLOSE_PCT};
use super::state::ArmCtrlOutput;
use comms_if::arm::{
    ArmJointState, ArmResult, ArmState, GripperState, ResultCode, StateNotice,
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Events consumed by the arm state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// We are connected to the arm
    Ready,
    /// Background deploy detected from telemetry
    Deployed,
    /// Background stow detected from telemetry
    Stowed,
    /// Start a new deploy action
    GoalDeploy,
    /// Start a new stow action
    GoalStow,
    /// Start a new move (pan and tilt) action
    GoalMove,
    /// Start a new gripper calibration
    GoalCalibrate,
    /// Start a new gripper set action
    GoalSet,
    /// Cancel the current goal
    GoalCancel,
    /// Pan sub-action complete
    PanComplete,
    /// Tilt sub-action complete
    TiltComplete,
    /// Gripper sub-action complete
    GripperComplete,
    /// Calibration complete
    CalibrateComplete,
    /// Current sub-action didn't complete in time
    Timeout,
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Observer notified synchronously on every state transition.
///
/// The event is `None` when the state was forced through the manual
/// override rather than by a table transition.
pub trait StateObserver: Send {
    fn on_transition(&mut self, state: ArmState, event: Option<Event>);
}

/// Default observer which logs each transition.
pub struct StateLogger;

impl StateObserver for StateLogger {
    fn on_transition(&mut self, state: ArmState, event: Option<Event>) {
        match event {
            Some(e) => debug!("Arm state changed to {:?} (on {:?})", state, e),
            None => debug!("Arm state forced to {:?}", state),
        }
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Context over which a transition's side effects run.
///
/// Split out from [`super::ArmCtrl`] so that the machine, the registry and
/// the gateway can be borrowed independently.
pub(crate) struct FsmContext<'a> {
    pub registry: &'a mut JointRegistry,
    pub gateway: &'a mut ActuationGateway,
    pub out: &'a mut ArmCtrlOutput,
}

/// The arm behaviour state machine.
pub struct ArmFsm {
    state: ArmState,
    observer: Box<dyn StateObserver>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a> FsmContext<'a> {
    /// Send the given joint towards its current goal.
    fn command_joint(&mut self, joint: JointType) -> bool {
        self.gateway.command_joint(self.registry, joint)
    }

    /// Reject a command without a state transition.
    ///
    /// Snaps every joint goal to its current value and reports the failure
    /// immediately on the result channel.
    pub(crate) fn reject(&mut self, code: ResultCode) {
        warn!("Arm command rejected: {:?}", code);
        self.registry.snap_goals_to_current();
        self.out.results.push(ArmResult::new(code));
    }
}

impl Default for ArmFsm {
    fn default() -> Self {
        Self::new(Box::new(StateLogger))
    }
}

impl ArmFsm {
    pub fn new(observer: Box<dyn StateObserver>) -> Self {
        Self {
            state: ArmState::Initializing,
            observer,
        }
    }

    /// The current state of the machine.
    pub fn state(&self) -> ArmState {
        self.state
    }

    /// Force the machine into the given state, bypassing the transition
    /// table.
    ///
    /// Used for recovery and testing only, no consistency with the actual
    /// joint positions is enforced.
    pub(crate) fn set_state(&mut self, state: ArmState, ctx: &mut FsmContext) {
        warn!("Arm state manually forced to {:?}", state);
        self.state = state;
        self.observer.on_transition(state, None);
        push_notice(self.state, ctx);
    }

    /// Process a single event against the transition table.
    ///
    /// At most one transition is applied per call. Events without a table
    /// entry for the current state are ignored, leaving the state and all
    /// joint goals unchanged.
    pub(crate) fn update(&mut self, event: Event, ctx: &mut FsmContext) {
        use comms_if::arm::ArmState as S;
        use Event as E;

        debug!("Received event {:?} in state {:?}", event, self.state);

        let next = match (self.state, event) {
            // INITIALIZING -> UNKNOWN on first feedback from the driver
            (S::Initializing, E::Ready) => S::Unknown,

            // Background classification of the resting pose
            (S::Unknown, E::Stowed) => S::Stowed,
            (S::Unknown, E::Deployed) => S::Deployed,
            (S::Stowed, E::Deployed) => S::Deployed,
            (S::Deployed, E::Stowed) => S::Stowed,

            // Deploy: pan then tilt
            (S::Stowed, E::GoalDeploy) => {
                if !ctx.command_joint(JointType::Pan) {
                    self.resolve(ResultCode::PanFailed, ctx)
                } else {
                    S::DeployingPanning
                }
            }
            (S::DeployingPanning, E::PanComplete) => {
                if !ctx.command_joint(JointType::Tilt) {
                    self.resolve(ResultCode::TiltFailed, ctx)
                } else {
                    S::DeployingTilting
                }
            }
            (S::DeployingTilting, E::TiltComplete) => self.resolve(ResultCode::Success, ctx),

            // Stow: close the gripper first if needed, then pan, then tilt
            (S::Deployed, E::GoalStow) => {
                if ctx.registry.requires_closing() {
                    if !ctx.command_joint(JointType::Gripper) {
                        self.resolve(ResultCode::GripperFailed, ctx)
                    } else {
                        S::StowingSetting
                    }
                } else if !ctx.command_joint(JointType::Pan) {
                    self.resolve(ResultCode::PanFailed, ctx)
                } else {
                    S::StowingPanning
                }
            }
            (S::StowingSetting, E::GripperComplete) => {
                if !ctx.command_joint(JointType::Pan) {
                    self.resolve(ResultCode::PanFailed, ctx)
                } else {
                    S::StowingPanning
                }
            }
            (S::StowingSetting, E::Timeout) | (S::StowingSetting, E::GoalCancel) => {
                self.resolve(ResultCode::GripperFailed, ctx)
            }
            (S::StowingPanning, E::PanComplete) => {
                if !ctx.command_joint(JointType::Tilt) {
                    self.resolve(ResultCode::TiltFailed, ctx)
                } else {
                    S::StowingTilting
                }
            }
            (S::StowingPanning, E::Timeout) | (S::StowingPanning, E::GoalCancel) => {
                self.resolve(ResultCode::PanFailed, ctx)
            }
            (S::StowingTilting, E::TiltComplete) => self.resolve(ResultCode::Success, ctx),
            (S::StowingTilting, E::Timeout) | (S::StowingTilting, E::GoalCancel) => {
                self.resolve(ResultCode::TiltFailed, ctx)
            }

            // Move: pan then tilt, allowed from either resting pose
            (S::Stowed, E::GoalMove) | (S::Deployed, E::GoalMove) => {
                if !ctx.command_joint(JointType::Pan) {
                    self.resolve(ResultCode::PanFailed, ctx)
                } else {
                    S::Panning
                }
            }
            (S::Panning, E::PanComplete) => {
                if !ctx.command_joint(JointType::Tilt) {
                    self.resolve(ResultCode::TiltFailed, ctx)
                } else {
                    S::Tilting
                }
            }
            (S::Panning, E::Timeout) | (S::Panning, E::GoalCancel) => {
                self.resolve(ResultCode::PanFailed, ctx)
            }
            (S::Tilting, E::TiltComplete) => self.resolve(ResultCode::Success, ctx),
            (S::Tilting, E::Timeout) | (S::Tilting, E::GoalCancel) => {
                self.resolve(ResultCode::TiltFailed, ctx)
            }

            // Gripper set
            (S::Deployed, E::GoalSet) => {
                if !ctx.command_joint(JointType::Gripper) {
                    self.resolve(ResultCode::GripperFailed, ctx)
                } else {
                    S::Setting
                }
            }
            (S::Setting, E::GripperComplete) => self.resolve(ResultCode::Success, ctx),
            (S::Setting, E::Timeout) | (S::Setting, E::GoalCancel) => {
                self.resolve(ResultCode::GripperFailed, ctx)
            }

            // Gripper calibration
            (S::Deployed, E::GoalCalibrate) => {
                if !ctx.command_joint(JointType::Gripper) {
                    self.resolve(ResultCode::CalibrateFailed, ctx)
                } else {
                    S::Calibrating
                }
            }
            (S::Calibrating, E::CalibrateComplete) => self.resolve(ResultCode::Success, ctx),
            (S::Calibrating, E::Timeout) | (S::Calibrating, E::GoalCancel) => {
                self.resolve(ResultCode::CalibrateFailed, ctx)
            }

            // No table entry: the event is ignored
            _ => return,
        };

        self.state = next;
        self.observer.on_transition(next, Some(event));
        push_notice(self.state, ctx);
    }

    /// Conclude the current action with the given result code.
    ///
    /// Every joint goal is snapped to its current value, forcing the
    /// position-controlled driver to hold position. If an action is in
    /// flight its terminal result is reported. The machine then resolves to
    /// the resting state matching the current arm pose, except after a
    /// communication error where a full re-synchronisation is forced.
    fn resolve(&self, code: ResultCode, ctx: &mut FsmContext) -> ArmState {
        ctx.registry.snap_goals_to_current();

        // A result is only owed to the commander if we are leaving an
        // active action state
        if self.state.is_active_action() {
            ctx.out.results.push(ArmResult::new(code));
        }

        // Losing communication with the low level driver means our idea of
        // the arm pose can no longer be trusted
        if code == ResultCode::CommunicationError {
            return ArmState::Initializing;
        }

        if ctx.registry.is_stowed() {
            ArmState::Stowed
        } else {
            ArmState::Deployed
        }
    }

    /// Resolve the current action from outside the table, used on watchdog
    /// expiry.
    pub(crate) fn force_resolve(&mut self, code: ResultCode, ctx: &mut FsmContext) {
        let next = self.resolve(code, ctx);
        self.state = next;
        self.observer.on_transition(next, None);
        push_notice(self.state, ctx);
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Derive the simplified gripper display state.
pub fn gripper_state(state: ArmState, gripper_value: f64, gripper_tol: f64) -> GripperState {
    if state == ArmState::Calibrating {
        GripperState::Calibrating
    } else if gripper_value < 0.0 {
        GripperState::Uncalibrated
    } else if (gripper_value - GRIPPER_CLOSE_PCT).abs() < gripper_tol {
        GripperState::Closed
    } else {
        GripperState::Open
    }
}

/// Derive the simplified joint motion display state.
pub fn joint_motion_state(state: ArmState) -> ArmJointState {
    match state {
        ArmState::Initializing | ArmState::Unknown => ArmJointState::Unknown,
        ArmState::DeployingPanning | ArmState::DeployingTilting => ArmJointState::Deploying,
        ArmState::Calibrating | ArmState::Deployed | ArmState::Setting => ArmJointState::Stopped,
        ArmState::Panning | ArmState::Tilting => ArmJointState::Moving,
        ArmState::StowingSetting | ArmState::StowingPanning | ArmState::StowingTilting => {
            ArmJointState::Stowing
        }
        ArmState::Stowed => ArmJointState::Stowed,
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Queue a state change notification for publication.
fn push_notice(state: ArmState, ctx: &mut FsmContext) {
    let (gripper_value, gripper_tol) = match ctx.registry.get(JointType::Gripper) {
        Some(info) => (info.value, info.tol),
        None => (0.0, 0.0),
    };

    ctx.out.state_changes.push(StateNotice {
        state,
        gripper_state: gripper_state(state, gripper_value, gripper_tol),
        joint_state: joint_motion_state(state),
    });
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_joint_motion_state() {
        assert_eq!(joint_motion_state(ArmState::Initializing), ArmJointState::Unknown);
        assert_eq!(joint_motion_state(ArmState::Unknown), ArmJointState::Unknown);
        assert_eq!(joint_motion_state(ArmState::Stowed), ArmJointState::Stowed);
        assert_eq!(joint_motion_state(ArmState::Deployed), ArmJointState::Stopped);
        assert_eq!(joint_motion_state(ArmState::Setting), ArmJointState::Stopped);
        assert_eq!(joint_motion_state(ArmState::Calibrating), ArmJointState::Stopped);
        assert_eq!(joint_motion_state(ArmState::Panning), ArmJointState::Moving);
        assert_eq!(joint_motion_state(ArmState::Tilting), ArmJointState::Moving);
        assert_eq!(joint_motion_state(ArmState::StowingSetting), ArmJointState::Stowing);
        assert_eq!(joint_motion_state(ArmState::DeployingPanning), ArmJointState::Deploying);
    }

    #[test]
    fn test_gripper_state() {
        // Calibrating wins over everything else
        assert_eq!(
            gripper_state(ArmState::Calibrating, -100.0, 2.0),
            GripperState::Calibrating
        );

        // Negative values mean uncalibrated
        assert_eq!(
            gripper_state(ArmState::Deployed, -100.0, 2.0),
            GripperState::Uncalibrated
        );

        // Within tolerance of closed
        assert_eq!(gripper_state(ArmState::Deployed, 1.0, 2.0), GripperState::Closed);

        // Otherwise open
        assert_eq!(gripper_state(ArmState::Deployed, 50.0, 2.0), GripperState::Open);
    }
}
