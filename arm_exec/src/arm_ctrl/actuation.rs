//! Joint actuation gateway and one-shot timers

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use std::time::{Duration, Instant};

// Internal
use super::{JointRegistry, JointType};
use comms_if::eqpt::joint::JointDem;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A one-shot timer polled by the cyclic exec.
///
/// The timer must be explicitly re-armed after it fires, and re-arming always
/// cancels any previously pending deadline, so a timer can never fire twice
/// for one arming.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneShotTimer {
    deadline: Option<Instant>,
}

/// The actuation gateway, responsible for issuing single-joint demands to
/// the downstream driver.
#[derive(Debug, Default)]
pub struct ActuationGateway {
    /// Duration of the per-goal timeout in seconds
    timeout_goal_s: f64,

    /// Timer bounding the time allowed for the current sub-action
    pub(crate) goal_timer: OneShotTimer,

    /// Demands waiting to be sent to the driver
    pending_dems: Vec<JointDem>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OneShotTimer {
    /// Arm the timer to fire after the given duration, cancelling any
    /// pending deadline.
    pub fn restart(&mut self, duration_s: f64) {
        self.deadline = Some(Instant::now() + Duration::from_secs_f64(duration_s));
    }

    /// Cancel the timer without firing it.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True if the timer is armed and has not yet fired.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Check if the timer has expired, disarming it if so.
    ///
    /// Returns true exactly once per arming.
    pub fn expired(&mut self) -> bool {
        match self.deadline {
            Some(d) if Instant::now() >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl ActuationGateway {
    pub fn new(timeout_goal_s: f64) -> Self {
        Self {
            timeout_goal_s,
            goal_timer: OneShotTimer::default(),
            pending_dems: Vec::new(),
        }
    }

    /// Command a single joint to its current goal.
    ///
    /// Converts the joint's goal into driver units, queues exactly one
    /// demand for the driver, and restarts the goal timer. Demands are never
    /// batched, each call produces one message.
    ///
    /// Returns false if the joint isn't registered, meaning the sub-action
    /// could not even be started.
    pub fn command_joint(&mut self, registry: &JointRegistry, joint: JointType) -> bool {
        // Check that we actually have the joint present
        let info = match registry.get(joint) {
            Some(i) => i,
            None => {
                warn!("{:?} is not a valid control goal", joint);
                return false;
            }
        };

        // Convert from human to low-level
        self.pending_dems.push(JointDem {
            name: info.name.clone(),
            pos: (info.goal - info.offset) / info.scale,
        });

        // Bound the time the sub-action may take
        self.goal_timer.restart(self.timeout_goal_s);

        true
    }

    /// Take all demands queued since the last call.
    pub fn take_pending(&mut self) -> Vec<JointDem> {
        std::mem::take(&mut self.pending_dems)
    }

    /// Number of demands waiting to be sent.
    #[cfg(test)]
    pub fn num_pending(&self) -> usize {
        self.pending_dems.len()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::test_utils::test_params;

    #[test]
    fn test_one_shot_timer() {
        let mut timer = OneShotTimer::default();

        assert!(!timer.is_armed());
        assert!(!timer.expired());

        // A zero-duration timer expires on the next poll, and only once
        timer.restart(0.0);
        assert!(timer.is_armed());
        assert!(timer.expired());
        assert!(!timer.expired());

        // Cancelling prevents firing
        timer.restart(0.0);
        timer.cancel();
        assert!(!timer.expired());

        // A long timer doesn't expire immediately
        timer.restart(60.0);
        assert!(!timer.expired());
        assert!(timer.is_armed());
    }

    #[test]
    fn test_command_joint() {
        let registry = JointRegistry::from_params(&test_params());
        let mut gateway = ActuationGateway::new(10.0);

        assert!(gateway.command_joint(&registry, JointType::Pan));

        // Exactly one demand per call, in driver units
        let dems = gateway.take_pending();
        assert_eq!(dems.len(), 1);
        assert_eq!(dems[0].name, "arm_pan_motor");
        assert!((dems[0].pos - 0.0).abs() < 1e-9);

        // The goal timer was armed by the command
        assert!(gateway.goal_timer.is_armed());
    }

    #[test]
    fn test_command_joint_driver_units() {
        let mut registry = JointRegistry::from_params(&test_params());
        let mut gateway = ActuationGateway::new(10.0);

        // A tilt goal of 0 degrees is -pi/2 in driver units (90 degree
        // offset, degrees to radians)
        registry.set_goal(JointType::Tilt, 0.0);
        assert!(gateway.command_joint(&registry, JointType::Tilt));

        let dems = gateway.take_pending();
        assert!((dems[0].pos + std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }
}
