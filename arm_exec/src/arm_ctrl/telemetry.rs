//! Telemetry ingestor
//!
//! Converts raw joint state batches from the driver into human units, feeds
//! the joint registry and raises completion events on the state machine.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::fsm::{ArmFsm, Event, FsmContext};
use super::{JointType, OneShotTimer, GRIPPER_CAL};
use comms_if::arm::ArmFeedback;
use comms_if::arm::ArmState;
use comms_if::eqpt::joint::{JointSample, JointStateBatch};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The telemetry ingestor.
///
/// Owns the liveness watchdog, which is re-armed on every recognised batch
/// and whose expiry means the link to the driver has been lost.
#[derive(Debug, Default)]
pub struct TelemetryIngestor {
    /// Duration of the liveness timeout in seconds
    timeout_watchdog_s: f64,

    /// Timer bounding the time without any recognised joint feedback
    pub(crate) watchdog: OneShotTimer,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TelemetryIngestor {
    pub fn new(timeout_watchdog_s: f64) -> Self {
        Self {
            timeout_watchdog_s,
            watchdog: OneShotTimer::default(),
        }
    }

    /// Ingest one batch of raw joint states.
    ///
    /// The whole batch is applied to the registry before any completion
    /// logic runs, so evaluation always sees the final positions of the
    /// batch. Samples with unknown names are ignored, and a batch with no
    /// recognised samples at all is a no-op which in particular does not
    /// reset the liveness watchdog.
    pub(crate) fn ingest(&mut self, batch: &JointStateBatch, fsm: &mut ArmFsm, ctx: &mut FsmContext) {
        // Update the registry with the batch, remembering which joints were
        // seen. For a joint sampled twice in one batch the last sample wins.
        let mut recognised: Vec<(JointType, f64, f64)> = Vec::new();

        for sample in &batch.samples {
            let joint = match ctx.registry.lookup_name(&sample.name) {
                Some(j) => j,
                None => continue,
            };

            let value = ctx.registry.convert_to_human(joint, sample.pos);
            if let Some(info) = ctx.registry.get_mut(joint) {
                info.value = value;
            }

            match recognised.iter_mut().find(|(j, _, _)| *j == joint) {
                Some(entry) => {
                    entry.1 = sample.vel;
                    entry.2 = sample.effort;
                }
                None => recognised.push((joint, sample.vel, sample.effort)),
            }
        }

        // If we didn't receive any valid joint updates we are done. An empty
        // or garbage batch must not reset the liveness timer.
        if recognised.is_empty() {
            return;
        }

        self.watchdog.restart(self.timeout_watchdog_s);

        // Build the derived sample report from the final positions
        for (joint, vel, effort) in &recognised {
            if let Some(info) = ctx.registry.get(*joint) {
                ctx.out.samples.push(JointSample {
                    name: info.generic.clone(),
                    angle_pos: info.value,
                    angle_vel: *vel,
                    current: *effort,
                });
            }
        }

        // Update the state machine
        match fsm.state() {
            // Waiting for first feedback
            ArmState::Initializing => fsm.update(Event::Ready, ctx),

            // Background classification of the resting pose
            ArmState::Unknown => {
                if ctx.registry.is_stowed() {
                    fsm.update(Event::Stowed, ctx)
                } else {
                    fsm.update(Event::Deployed, ctx)
                }
            }
            // Catch a manual deploy
            ArmState::Stowed => {
                if !ctx.registry.is_stowed() {
                    fsm.update(Event::Deployed, ctx)
                }
            }
            // Catch a manual stow
            ArmState::Deployed => {
                if ctx.registry.is_stowed() {
                    fsm.update(Event::Stowed, ctx)
                }
            }

            // Pan wait states
            ArmState::Panning | ArmState::StowingPanning | ArmState::DeployingPanning => {
                if ctx.registry.is_at_goal(JointType::Pan) {
                    ctx.gateway.goal_timer.cancel();
                    fsm.update(Event::PanComplete, ctx);
                }
            }

            // Tilt wait states
            ArmState::Tilting | ArmState::StowingTilting | ArmState::DeployingTilting => {
                if ctx.registry.is_at_goal(JointType::Tilt) {
                    ctx.gateway.goal_timer.cancel();
                    fsm.update(Event::TiltComplete, ctx);
                }
            }

            // Gripper wait states
            ArmState::Setting | ArmState::StowingSetting => {
                if ctx.registry.is_at_goal(JointType::Gripper) {
                    ctx.gateway.goal_timer.cancel();
                    fsm.update(Event::GripperComplete, ctx);
                }
            }

            // Calibration is complete once the gripper leaves the sentinel
            ArmState::Calibrating => {
                if !ctx.registry.is_at_target(JointType::Gripper, GRIPPER_CAL) {
                    ctx.gateway.goal_timer.cancel();
                    fsm.update(Event::CalibrateComplete, ctx);
                }
            }
        }

        // Stream a feedback snapshot while an action is in flight
        if fsm.state().is_active_action() {
            ctx.out.feedback = Some(ArmFeedback {
                state: fsm.state(),
                pan_deg: ctx.registry.value(JointType::Pan),
                tilt_deg: ctx.registry.value(JointType::Tilt),
                gripper_pct: ctx.registry.value(JointType::Gripper),
            });
        }
    }
}
