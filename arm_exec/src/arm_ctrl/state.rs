//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

// Internal
use super::fsm::FsmContext;
use super::{arbiter, ActuationGateway, ArmCtrlError, ArmFsm, Event, JointRegistry, JointType,
    Params, TelemetryIngestor};
use comms_if::arm::{ArmFeedback, ArmJointState, ArmResult, ArmState, GripperState, ResultCode,
    StateNotice};
use comms_if::eqpt::joint::{JointDem, JointSample, JointStateBatch};
use comms_if::tc::arm_ctrl::{ArmCmd, ArmTolerances};
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
#[derive(Default)]
pub struct ArmCtrl {
    pub(crate) params: Params,

    pub(crate) fsm: ArmFsm,

    pub(crate) registry: JointRegistry,

    pub(crate) gateway: ActuationGateway,

    pub(crate) ingestor: TelemetryIngestor,

    pub(crate) report: StatusReport,
}

/// Input data to Arm Control.
#[derive(Debug, Default)]
pub struct InputData {
    /// The arm request to be executed, or `None` if there is no new request
    /// on this cycle.
    pub cmd: Option<ArmTcRequest>,

    /// Raw joint state batches received from the driver this cycle, oldest
    /// first. Each batch is evaluated atomically.
    pub joint_states: Vec<JointStateBatch>,
}

/// Output data produced by one cycle of Arm Control.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArmCtrlOutput {
    /// Joint demands to be sent to the driver, one message each
    pub joint_dems: Vec<JointDem>,

    /// Terminal results concluded this cycle
    pub results: Vec<ArmResult>,

    /// Feedback snapshot for the commander, present while an action is in
    /// flight
    pub feedback: Option<ArmFeedback>,

    /// Derived joint samples in human units
    pub samples: Vec<JointSample>,

    /// State change notifications raised this cycle
    pub state_changes: Vec<StateNotice>,
}

/// Status report for ArmCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatusReport {
    /// Current state of the arm state machine
    pub state: ArmState,

    /// Simplified gripper display state
    pub gripper_state: GripperState,

    /// Simplified joint motion display state
    pub joint_state: ArmJointState,

    /// True if a sub-action is currently bounded by the goal timer
    pub goal_timer_armed: bool,

    /// True if driver feedback has been seen and is being watched
    pub watchdog_armed: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A request for the arm control module, decoded from a telecommand.
#[derive(Debug, Clone)]
pub enum ArmTcRequest {
    /// A new goal command
    Goal(ArmCmd),

    /// A command which could not be interpreted
    Invalid,

    /// Manual state override, bypassing the transition table
    SetState(ArmState),

    /// Update the joint tolerances
    SetTolerances(ArmTolerances),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for ArmCtrl {
    type InitData = &'static str;
    type InitError = ArmCtrlError;

    type InputData = InputData;
    type OutputData = ArmCtrlOutput;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Initialise the ArmCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        // Load the parameters
        let params: Params =
            util::params::load(init_data).map_err(ArmCtrlError::ParamLoadError)?;

        *self = Self::from_params(params)?;

        info!(
            "ArmCtrl initialised, goal timeout {} s, watchdog timeout {} s",
            self.params.timeout_goal_s, self.params.timeout_watchdog_s
        );

        Ok(())
    }

    /// Perform cyclic processing of Arm Control.
    ///
    /// Incoming requests, joint state batches and timer expiries are
    /// serialised onto the state machine here, one event at a time.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut out = ArmCtrlOutput::default();

        // Telecommand handling
        if let Some(req) = &input_data.cmd {
            let mut ctx = FsmContext {
                registry: &mut self.registry,
                gateway: &mut self.gateway,
                out: &mut out,
            };

            match req {
                ArmTcRequest::Goal(cmd) => arbiter::arbitrate(cmd, &mut self.fsm, &mut ctx),
                ArmTcRequest::Invalid => ctx.reject(ResultCode::InvalidCommand),
                ArmTcRequest::SetState(state) => self.fsm.set_state(*state, &mut ctx),
                ArmTcRequest::SetTolerances(tols) => {
                    if self.fsm.state().is_quiescent() {
                        ctx.registry.set_tolerances(
                            tols.tol_pan_deg,
                            tols.tol_tilt_deg,
                            tols.tol_gripper_pct,
                        );
                        info!("Joint tolerances updated: {:?}", tols);
                    } else {
                        warn!(
                            "Joint tolerances can only be changed while resting, not in {:?}",
                            self.fsm.state()
                        );
                    }
                }
            }
        }

        // Telemetry handling, batch by batch
        for batch in &input_data.joint_states {
            let mut ctx = FsmContext {
                registry: &mut self.registry,
                gateway: &mut self.gateway,
                out: &mut out,
            };

            self.ingestor.ingest(batch, &mut self.fsm, &mut ctx);
        }

        // Sub-action timeout
        if self.gateway.goal_timer.expired() {
            warn!("Goal timeout expired in state {:?}", self.fsm.state());

            let mut ctx = FsmContext {
                registry: &mut self.registry,
                gateway: &mut self.gateway,
                out: &mut out,
            };

            self.fsm.update(Event::Timeout, &mut ctx);
        }

        // Liveness watchdog. Expiry means the driver went silent, which is
        // the most severe failure class: any in-flight goal is discarded and
        // the machine is forced back to Initializing.
        if self.ingestor.watchdog.expired() {
            error!(
                "No joint feedback for {} s, link to the driver is considered lost",
                self.params.timeout_watchdog_s
            );

            let mut ctx = FsmContext {
                registry: &mut self.registry,
                gateway: &mut self.gateway,
                out: &mut out,
            };

            self.fsm
                .force_resolve(ResultCode::CommunicationError, &mut ctx);
        }

        // Collect the demands raised by any of the above
        out.joint_dems = self.gateway.take_pending();

        self.report = StatusReport {
            state: self.fsm.state(),
            gripper_state: super::fsm::gripper_state(
                self.fsm.state(),
                self.registry.value(JointType::Gripper),
                self.registry
                    .get(JointType::Gripper)
                    .map(|i| i.tol)
                    .unwrap_or(0.0),
            ),
            joint_state: super::fsm::joint_motion_state(self.fsm.state()),
            goal_timer_armed: self.gateway.goal_timer.is_armed(),
            watchdog_armed: self.ingestor.watchdog.is_armed(),
        };

        Ok((out, self.report))
    }
}

impl ArmCtrl {
    /// Build the module from already-loaded parameters.
    pub fn from_params(params: Params) -> Result<Self, ArmCtrlError> {
        let names = [
            params.pan_joint_name.as_str(),
            params.tilt_joint_name.as_str(),
            params.gripper_joint_name.as_str(),
        ];

        if names.iter().any(|n| n.is_empty()) {
            return Err(ArmCtrlError::InvalidJointConfig(
                "joint names must not be empty".into(),
            ));
        }

        if names[0] == names[1] || names[0] == names[2] || names[1] == names[2] {
            return Err(ArmCtrlError::InvalidJointConfig(
                "joint names must be distinct".into(),
            ));
        }

        Ok(Self {
            registry: JointRegistry::from_params(&params),
            gateway: ActuationGateway::new(params.timeout_goal_s),
            ingestor: TelemetryIngestor::new(params.timeout_watchdog_s),
            fsm: ArmFsm::default(),
            report: StatusReport::default(),
            params,
        })
    }

    /// The current state of the arm state machine.
    pub fn state(&self) -> ArmState {
        self.fsm.state()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::fsm::{Event, FsmContext};
    use super::super::test_utils::{batch, test_params, DEPLOY_TILT_RAD, STOW_TILT_RAD};
    use super::super::{JointType, GRIPPER_CAL, PAN_MAX_DEG, TILT_MAX_DEG};
    use super::*;
    use comms_if::arm::ActionOutcome;

    /// Run one cycle with the given command and no telemetry.
    fn proc_cmd(ctrl: &mut ArmCtrl, cmd: ArmCmd) -> ArmCtrlOutput {
        let input = InputData {
            cmd: Some(ArmTcRequest::Goal(cmd)),
            joint_states: vec![],
        };
        ctrl.proc(&input).unwrap().0
    }

    /// Run one cycle with a single joint state batch and no command.
    fn proc_batch(ctrl: &mut ArmCtrl, samples: &[(&str, f64)]) -> ArmCtrlOutput {
        let input = InputData {
            cmd: None,
            joint_states: vec![batch(samples)],
        };
        ctrl.proc(&input).unwrap().0
    }

    /// Run one cycle with no inputs at all.
    fn proc_empty(ctrl: &mut ArmCtrl) -> ArmCtrlOutput {
        ctrl.proc(&InputData::default()).unwrap().0
    }

    /// Build an arm resting in the stowed pose, gripper uncalibrated.
    fn stowed_arm() -> ArmCtrl {
        let mut ctrl = ArmCtrl::from_params(test_params()).unwrap();

        // First batch takes us out of Initializing, second classifies the
        // pose
        proc_batch(
            &mut ctrl,
            &[
                ("arm_pan_motor", 0.0),
                ("arm_tilt_motor", STOW_TILT_RAD),
                ("arm_gripper_motor", GRIPPER_CAL),
            ],
        );
        proc_batch(
            &mut ctrl,
            &[
                ("arm_pan_motor", 0.0),
                ("arm_tilt_motor", STOW_TILT_RAD),
                ("arm_gripper_motor", GRIPPER_CAL),
            ],
        );

        assert_eq!(ctrl.state(), ArmState::Stowed);
        ctrl
    }

    /// Build an arm resting in the deployed pose with the given raw gripper
    /// reading.
    fn deployed_arm(gripper_raw: f64) -> ArmCtrl {
        let mut ctrl = ArmCtrl::from_params(test_params()).unwrap();

        proc_batch(
            &mut ctrl,
            &[
                ("arm_pan_motor", 0.0),
                ("arm_tilt_motor", DEPLOY_TILT_RAD),
                ("arm_gripper_motor", gripper_raw),
            ],
        );
        proc_batch(
            &mut ctrl,
            &[
                ("arm_pan_motor", 0.0),
                ("arm_tilt_motor", DEPLOY_TILT_RAD),
                ("arm_gripper_motor", gripper_raw),
            ],
        );

        assert_eq!(ctrl.state(), ArmState::Deployed);
        ctrl
    }

    #[test]
    fn test_startup_classification() {
        let mut ctrl = ArmCtrl::from_params(test_params()).unwrap();
        assert_eq!(ctrl.state(), ArmState::Initializing);

        // First feedback only takes us to Unknown
        let out = proc_batch(&mut ctrl, &[("arm_pan_motor", 0.0)]);
        assert_eq!(ctrl.state(), ArmState::Unknown);
        assert_eq!(out.state_changes.len(), 1);

        // Second feedback classifies the pose (not stowed here, tilt is 90)
        proc_batch(&mut ctrl, &[("arm_tilt_motor", 0.0)]);
        assert_eq!(ctrl.state(), ArmState::Deployed);
    }

    #[test]
    fn test_unknown_telemetry_ignored() {
        let mut ctrl = ArmCtrl::from_params(test_params()).unwrap();

        // A batch of entirely unknown joints is a no-op: no event, no
        // watchdog arming, no samples
        let out = proc_batch(&mut ctrl, &[("leg_motor", 1.0), ("antenna", 2.0)]);
        assert_eq!(ctrl.state(), ArmState::Initializing);
        assert!(out.samples.is_empty());
        assert!(!ctrl.ingestor.watchdog.is_armed());
    }

    #[test]
    fn test_deploy_sequence() {
        let mut ctrl = stowed_arm();

        // Deploy starts with the pan sub-action
        let out = proc_cmd(&mut ctrl, ArmCmd::Deploy);
        assert_eq!(ctrl.state(), ArmState::DeployingPanning);
        assert_eq!(out.joint_dems.len(), 1);
        assert_eq!(out.joint_dems[0].name, "arm_pan_motor");
        assert!(out.results.is_empty());

        // Pan reaches its goal, tilt is commanded
        let out = proc_batch(&mut ctrl, &[("arm_pan_motor", 0.0)]);
        assert_eq!(ctrl.state(), ArmState::DeployingTilting);
        assert_eq!(out.joint_dems.len(), 1);
        assert_eq!(out.joint_dems[0].name, "arm_tilt_motor");

        // Tilt reaches its goal, the action succeeds and the arm rests
        // deployed
        let out = proc_batch(&mut ctrl, &[("arm_tilt_motor", DEPLOY_TILT_RAD)]);
        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].response, ResultCode::Success);
        assert_eq!(out.results[0].outcome, ActionOutcome::Succeeded);
    }

    #[test]
    fn test_stow_skips_gripper_when_not_required() {
        // An uncalibrated gripper cannot be closed, so stowing goes straight
        // to the pan phase
        let mut ctrl = deployed_arm(GRIPPER_CAL);
        proc_cmd(&mut ctrl, ArmCmd::Stow);
        assert_eq!(ctrl.state(), ArmState::StowingPanning);
    }

    #[test]
    fn test_stow_closes_open_gripper_first() {
        // A calibrated gripper away from the stow opening is closed first
        let mut ctrl = deployed_arm(12.5);
        let out = proc_cmd(&mut ctrl, ArmCmd::Stow);
        assert_eq!(ctrl.state(), ArmState::StowingSetting);
        assert_eq!(out.joint_dems[0].name, "arm_gripper_motor");

        // Gripper closes, stow continues with pan
        proc_batch(&mut ctrl, &[("arm_gripper_motor", 0.0)]);
        assert_eq!(ctrl.state(), ArmState::StowingPanning);

        // Pan and tilt complete, the arm rests stowed
        proc_batch(&mut ctrl, &[("arm_pan_motor", 0.0)]);
        assert_eq!(ctrl.state(), ArmState::StowingTilting);
        let out = proc_batch(&mut ctrl, &[("arm_tilt_motor", STOW_TILT_RAD)]);
        assert_eq!(ctrl.state(), ArmState::Stowed);
        assert_eq!(out.results[0].response, ResultCode::Success);
    }

    #[test]
    fn test_move_rejected_bad_tilt() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        let out = proc_cmd(
            &mut ctrl,
            ArmCmd::Move {
                pan_deg: 0.0,
                tilt_deg: TILT_MAX_DEG + 20.0,
            },
        );

        // Rejected synchronously: no transition, no demands, immediate
        // aborted result
        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert!(out.joint_dems.is_empty());
        assert!(out.state_changes.is_empty());
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].response, ResultCode::BadTiltValue);
        assert_eq!(out.results[0].outcome, ActionOutcome::Aborted);
    }

    #[test]
    fn test_move_rejected_bad_pan() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        let out = proc_cmd(
            &mut ctrl,
            ArmCmd::Move {
                pan_deg: PAN_MAX_DEG + 5.0,
                tilt_deg: 45.0,
            },
        );

        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert_eq!(out.results[0].response, ResultCode::BadPanValue);
    }

    #[test]
    fn test_move_rejected_collision() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        // Tilt above the safe threshold with pan far from the stow position
        // would collide with the arm housing
        let out = proc_cmd(
            &mut ctrl,
            ArmCmd::Move {
                pan_deg: 45.0,
                tilt_deg: 150.0,
            },
        );

        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert!(out.joint_dems.is_empty());
        assert_eq!(out.results[0].response, ResultCode::CollisionAvoided);
    }

    #[test]
    fn test_move_high_tilt_allowed_at_stow_pan() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        // The same high tilt is fine while pan stays at the stow position
        let out = proc_cmd(
            &mut ctrl,
            ArmCmd::Move {
                pan_deg: 0.0,
                tilt_deg: 150.0,
            },
        );

        assert_eq!(ctrl.state(), ArmState::Panning);
        assert_eq!(out.joint_dems.len(), 1);
    }

    #[test]
    fn test_pan_keeps_tilt_goal() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        proc_cmd(&mut ctrl, ArmCmd::Pan { pan_deg: 30.0 });

        assert_eq!(ctrl.state(), ArmState::Panning);
        assert_eq!(ctrl.registry.goal(JointType::Pan), 30.0);
        // The unspecified tilt axis falls back to its previous goal
        assert_eq!(ctrl.registry.goal(JointType::Tilt), 0.0);
    }

    #[test]
    fn test_gripper_set_uncalibrated() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        let out = proc_cmd(&mut ctrl, ArmCmd::GripperSet { percent: 60.0 });

        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert_eq!(out.results[0].response, ResultCode::NeedToCalibrate);
    }

    #[test]
    fn test_gripper_set_bad_value() {
        let mut ctrl = deployed_arm(12.5);

        let out = proc_cmd(&mut ctrl, ArmCmd::GripperSet { percent: 150.0 });

        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert_eq!(out.results[0].response, ResultCode::BadGripperValue);
    }

    #[test]
    fn test_gripper_set_sequence() {
        let mut ctrl = deployed_arm(12.5);

        let out = proc_cmd(&mut ctrl, ArmCmd::GripperSet { percent: 80.0 });
        assert_eq!(ctrl.state(), ArmState::Setting);
        assert_eq!(out.joint_dems[0].name, "arm_gripper_motor");

        // 80 percent is a raw jaw opening of 20 mm
        let out = proc_batch(&mut ctrl, &[("arm_gripper_motor", 20.0)]);
        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert_eq!(out.results[0].response, ResultCode::Success);
    }

    #[test]
    fn test_calibration_sequence() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        let out = proc_cmd(&mut ctrl, ArmCmd::GripperCalibrate);
        assert_eq!(ctrl.state(), ArmState::Calibrating);
        // The calibration is requested on the gripper joint, not any other
        assert_eq!(out.joint_dems.len(), 1);
        assert_eq!(out.joint_dems[0].name, "arm_gripper_motor");
        assert_eq!(ctrl.registry.goal(JointType::Gripper), GRIPPER_CAL);
        // The tilt goal is untouched by a calibration request
        assert_eq!(ctrl.registry.goal(JointType::Tilt), 0.0);

        // While the driver still reports the sentinel the calibration is
        // ongoing
        proc_batch(&mut ctrl, &[("arm_gripper_motor", GRIPPER_CAL)]);
        assert_eq!(ctrl.state(), ArmState::Calibrating);

        // A real position means the calibration finished
        let out = proc_batch(&mut ctrl, &[("arm_gripper_motor", 0.0)]);
        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert_eq!(out.results[0].response, ResultCode::Success);
    }

    #[test]
    fn test_goal_timeout_fails_subaction() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        proc_cmd(
            &mut ctrl,
            ArmCmd::Move {
                pan_deg: 45.0,
                tilt_deg: 45.0,
            },
        );
        assert_eq!(ctrl.state(), ArmState::Panning);

        // Force the goal timer to expire on the next cycle
        ctrl.gateway.goal_timer.restart(0.0);
        let out = proc_empty(&mut ctrl);

        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert_eq!(out.results[0].response, ResultCode::PanFailed);
        // The goals were snapped to the current values to stop the arm
        assert_eq!(ctrl.registry.goal(JointType::Pan), ctrl.registry.value(JointType::Pan));
        assert_eq!(
            ctrl.registry.goal(JointType::Tilt),
            ctrl.registry.value(JointType::Tilt)
        );
    }

    #[test]
    fn test_watchdog_expiry_forces_initializing() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        proc_cmd(
            &mut ctrl,
            ArmCmd::Move {
                pan_deg: 45.0,
                tilt_deg: 45.0,
            },
        );
        assert_eq!(ctrl.state(), ArmState::Panning);

        // Force the watchdog to expire on the next cycle
        ctrl.ingestor.watchdog.restart(0.0);
        let out = proc_empty(&mut ctrl);

        // Link loss always resolves to Initializing, regardless of pose
        assert_eq!(ctrl.state(), ArmState::Initializing);
        assert_eq!(out.results[0].response, ResultCode::CommunicationError);
        assert_eq!(out.results[0].outcome, ActionOutcome::Aborted);
        assert_eq!(ctrl.registry.goal(JointType::Pan), ctrl.registry.value(JointType::Pan));
        assert_eq!(
            ctrl.registry.goal(JointType::Tilt),
            ctrl.registry.value(JointType::Tilt)
        );
    }

    #[test]
    fn test_stop_cancels_action() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        proc_cmd(
            &mut ctrl,
            ArmCmd::Move {
                pan_deg: 45.0,
                tilt_deg: 45.0,
            },
        );
        assert_eq!(ctrl.state(), ArmState::Panning);

        let out = proc_cmd(&mut ctrl, ArmCmd::Stop);

        // Cancellation of the pan phase reports a pan failure and freezes
        // all goals
        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert_eq!(out.results[0].response, ResultCode::PanFailed);
        assert_eq!(ctrl.registry.goal(JointType::Pan), ctrl.registry.value(JointType::Pan));
    }

    #[test]
    fn test_stop_in_resting_state_harmless() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        let out = proc_cmd(&mut ctrl, ArmCmd::Stop);

        // GoalCancel has no entry in Deployed, so nothing happens
        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert!(out.results.is_empty());
        assert!(out.state_changes.is_empty());
    }

    #[test]
    fn test_new_command_preempts_running_action() {
        let mut ctrl = deployed_arm(12.5);

        proc_cmd(
            &mut ctrl,
            ArmCmd::Move {
                pan_deg: 45.0,
                tilt_deg: 45.0,
            },
        );
        assert_eq!(ctrl.state(), ArmState::Panning);

        // The new gripper command first cancels the move, then runs
        let out = proc_cmd(&mut ctrl, ArmCmd::GripperOpen);

        assert_eq!(ctrl.state(), ArmState::Setting);
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].response, ResultCode::PanFailed);
    }

    #[test]
    fn test_not_allowed_commands() {
        // Deploy is only valid from Stowed
        let mut ctrl = deployed_arm(GRIPPER_CAL);
        let out = proc_cmd(&mut ctrl, ArmCmd::Deploy);
        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert_eq!(out.results[0].response, ResultCode::NotAllowed);

        // Stow and gripper actions are only valid from Deployed
        let mut ctrl = stowed_arm();
        let out = proc_cmd(&mut ctrl, ArmCmd::Stow);
        assert_eq!(ctrl.state(), ArmState::Stowed);
        assert_eq!(out.results[0].response, ResultCode::NotAllowed);

        let out = proc_cmd(&mut ctrl, ArmCmd::GripperCalibrate);
        assert_eq!(out.results[0].response, ResultCode::NotAllowed);
    }

    #[test]
    fn test_invalid_command_rejected() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        let input = InputData {
            cmd: Some(ArmTcRequest::Invalid),
            joint_states: vec![],
        };
        let (out, _) = ctrl.proc(&input).unwrap();

        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert_eq!(out.results[0].response, ResultCode::InvalidCommand);
    }

    #[test]
    fn test_completion_events_ignored_when_resting() {
        // Applying completion events in a resting state must be a no-op
        let mut ctrl = deployed_arm(GRIPPER_CAL);
        let pan_goal = ctrl.registry.goal(JointType::Pan);

        for event in [
            Event::PanComplete,
            Event::TiltComplete,
            Event::GripperComplete,
            Event::CalibrateComplete,
            Event::Timeout,
            Event::GoalCancel,
        ]
        .iter()
        {
            let mut out = ArmCtrlOutput::default();
            let mut ctx = FsmContext {
                registry: &mut ctrl.registry,
                gateway: &mut ctrl.gateway,
                out: &mut out,
            };
            ctrl.fsm.update(*event, &mut ctx);

            assert_eq!(ctrl.fsm.state(), ArmState::Deployed);
            assert!(out.results.is_empty());
            assert!(out.state_changes.is_empty());
        }

        assert_eq!(ctrl.registry.goal(JointType::Pan), pan_goal);
    }

    #[test]
    fn test_repeated_telemetry_idempotent() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        // Re-sending the resting pose over and over never raises results or
        // state changes
        for _ in 0..5 {
            let out = proc_batch(
                &mut ctrl,
                &[
                    ("arm_pan_motor", 0.0),
                    ("arm_tilt_motor", DEPLOY_TILT_RAD),
                ],
            );
            assert_eq!(ctrl.state(), ArmState::Deployed);
            assert!(out.results.is_empty());
            assert!(out.state_changes.is_empty());
        }
    }

    #[test]
    fn test_feedback_streamed_during_action() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        proc_cmd(
            &mut ctrl,
            ArmCmd::Move {
                pan_deg: 45.0,
                tilt_deg: 45.0,
            },
        );

        // A sample short of the goal produces feedback but no completion
        let out = proc_batch(&mut ctrl, &[("arm_pan_motor", 0.2)]);
        assert_eq!(ctrl.state(), ArmState::Panning);

        let feedback = out.feedback.expect("feedback expected during an action");
        assert_eq!(feedback.state, ArmState::Panning);
        assert!((feedback.pan_deg - 0.2_f64.to_degrees()).abs() < 1e-9);
        assert!(out.results.is_empty());
    }

    #[test]
    fn test_set_state_override() {
        let mut ctrl = stowed_arm();

        let input = InputData {
            cmd: Some(ArmTcRequest::SetState(ArmState::Deployed)),
            joint_states: vec![],
        };
        let (out, report) = ctrl.proc(&input).unwrap();

        // The override bypasses the table entirely
        assert_eq!(ctrl.state(), ArmState::Deployed);
        assert_eq!(out.state_changes.len(), 1);
        assert_eq!(out.state_changes[0].state, ArmState::Deployed);
        assert_eq!(report.state, ArmState::Deployed);
    }

    #[test]
    fn test_set_tolerances_only_while_resting() {
        let mut ctrl = deployed_arm(GRIPPER_CAL);

        let tols = ArmTolerances {
            tol_pan_deg: 5.0,
            tol_tilt_deg: 6.0,
            tol_gripper_pct: 7.0,
        };

        // Accepted while resting
        let input = InputData {
            cmd: Some(ArmTcRequest::SetTolerances(tols)),
            joint_states: vec![],
        };
        ctrl.proc(&input).unwrap();
        assert_eq!(ctrl.registry.get(JointType::Pan).unwrap().tol, 5.0);

        // Ignored while an action is running
        proc_cmd(
            &mut ctrl,
            ArmCmd::Move {
                pan_deg: 45.0,
                tilt_deg: 45.0,
            },
        );
        let input = InputData {
            cmd: Some(ArmTcRequest::SetTolerances(ArmTolerances {
                tol_pan_deg: 9.0,
                tol_tilt_deg: 9.0,
                tol_gripper_pct: 9.0,
            })),
            joint_states: vec![],
        };
        ctrl.proc(&input).unwrap();
        assert_eq!(ctrl.registry.get(JointType::Pan).unwrap().tol, 5.0);
    }

    #[test]
    fn test_invalid_joint_config() {
        let mut params = test_params();
        params.tilt_joint_name = params.pan_joint_name.clone();
        assert!(ArmCtrl::from_params(params).is_err());

        let mut params = test_params();
        params.gripper_joint_name = String::new();
        assert!(ArmCtrl::from_params(params).is_err());
    }
}
