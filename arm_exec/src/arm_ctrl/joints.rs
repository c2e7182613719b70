//! Joint registry and per-joint calibration data

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Internal
use super::{
    Params, GRIPPER_CAL, GRIPPER_OFFSET_PCT, GRIPPER_SCALE_PCT, PAN_OFFSET_DEG, PAN_STOW_DEG,
    GRIPPER_STOW_PCT, RADS_TO_DEGS, TILT_OFFSET_DEG, TILT_STOW_DEG,
};
use util::maths::ang_equal_deg;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The three joints actuated by the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointType {
    Pan,
    Tilt,
    Gripper,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Calibration and tracking data for a single joint.
///
/// Values are related by `human = scale * driver + offset`, with `scale`
/// never zero.
#[derive(Debug, Clone)]
pub struct JointInfo {
    /// Low level joint state name
    pub name: String,

    /// Generic name for the joint
    pub generic: String,

    /// Last observed position in human form
    pub value: f64,

    /// Current goal in human form
    pub goal: f64,

    /// Tolerance in human form
    pub tol: f64,

    /// DRIVER -> HUMAN offset
    pub offset: f64,

    /// DRIVER -> HUMAN scale
    pub scale: f64,
}

/// Registry of all joints on the arm.
///
/// Holds the per-joint calibration data plus a reverse lookup from the
/// driver's joint names to joint types, used to demultiplex telemetry.
#[derive(Debug, Clone, Default)]
pub struct JointRegistry {
    joints: HashMap<JointType, JointInfo>,
    dictionary: HashMap<String, JointType>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointRegistry {
    /// Build the registry from the module parameters.
    ///
    /// Joint names and tolerances come from the parameter file, offsets and
    /// scales are compiled in.
    pub fn from_params(params: &Params) -> Self {
        let mut joints = HashMap::new();
        let mut dictionary = HashMap::new();

        joints.insert(
            JointType::Pan,
            JointInfo {
                name: params.pan_joint_name.clone(),
                generic: "pan".into(),
                value: 0.0,
                goal: 0.0,
                tol: params.tol_pan_deg,
                offset: PAN_OFFSET_DEG,
                scale: RADS_TO_DEGS,
            },
        );
        dictionary.insert(params.pan_joint_name.clone(), JointType::Pan);

        joints.insert(
            JointType::Tilt,
            JointInfo {
                name: params.tilt_joint_name.clone(),
                generic: "tilt".into(),
                value: 0.0,
                goal: 0.0,
                tol: params.tol_tilt_deg,
                offset: TILT_OFFSET_DEG,
                scale: RADS_TO_DEGS,
            },
        );
        dictionary.insert(params.tilt_joint_name.clone(), JointType::Tilt);

        joints.insert(
            JointType::Gripper,
            JointInfo {
                name: params.gripper_joint_name.clone(),
                generic: "gripper".into(),
                // The gripper starts uncalibrated
                value: GRIPPER_CAL,
                goal: GRIPPER_CAL,
                tol: params.tol_gripper_pct,
                offset: GRIPPER_OFFSET_PCT,
                scale: GRIPPER_SCALE_PCT,
            },
        );
        dictionary.insert(params.gripper_joint_name.clone(), JointType::Gripper);

        Self { joints, dictionary }
    }

    /// Get the info for the given joint, or `None` if it isn't registered.
    pub fn get(&self, joint: JointType) -> Option<&JointInfo> {
        self.joints.get(&joint)
    }

    /// Get mutable info for the given joint.
    pub fn get_mut(&mut self, joint: JointType) -> Option<&mut JointInfo> {
        self.joints.get_mut(&joint)
    }

    /// Reverse-lookup a joint type from a low-level joint name.
    pub fn lookup_name(&self, name: &str) -> Option<JointType> {
        self.dictionary.get(name).copied()
    }

    /// Convert a raw driver position into human form for the given joint.
    ///
    /// The gripper has a special case: the calibration sentinel bypasses the
    /// affine conversion, so that the uncalibrated flag survives telemetry
    /// updates.
    pub fn convert_to_human(&self, joint: JointType, driver_value: f64) -> f64 {
        let info = match self.get(joint) {
            Some(i) => i,
            None => return driver_value,
        };

        if joint == JointType::Gripper && driver_value == GRIPPER_CAL {
            return GRIPPER_CAL;
        }

        driver_value * info.scale + info.offset
    }

    /// Check if the given joint's value is at the target, to within the
    /// joint's tolerance and respecting angular wraparound.
    pub fn is_at_target(&self, joint: JointType, target: f64) -> bool {
        match self.get(joint) {
            Some(info) => ang_equal_deg(info.value, target, info.tol),
            None => false,
        }
    }

    /// Check if the given joint's value has reached its current goal.
    pub fn is_at_goal(&self, joint: JointType) -> bool {
        match self.get(joint) {
            Some(info) => ang_equal_deg(info.value, info.goal, info.tol),
            None => false,
        }
    }

    /// Look at the pan and tilt angles to determine if the arm is stowed.
    pub fn is_stowed(&self) -> bool {
        self.is_at_target(JointType::Pan, PAN_STOW_DEG)
            && self.is_at_target(JointType::Tilt, TILT_STOW_DEG)
    }

    /// Check if the gripper needs closing before a stow can begin.
    ///
    /// An uncalibrated gripper cannot be closed, so only a calibrated
    /// gripper which is away from the stow opening requires closing.
    pub fn requires_closing(&self) -> bool {
        if self.is_at_target(JointType::Gripper, GRIPPER_CAL) {
            return false;
        }

        !self.is_at_target(JointType::Gripper, GRIPPER_STOW_PCT)
    }

    /// Get the current value of the given joint, or 0 if it isn't
    /// registered.
    pub fn value(&self, joint: JointType) -> f64 {
        self.get(joint).map(|i| i.value).unwrap_or(0.0)
    }

    /// Get the current goal of the given joint, or 0 if it isn't registered.
    pub fn goal(&self, joint: JointType) -> f64 {
        self.get(joint).map(|i| i.goal).unwrap_or(0.0)
    }

    /// Set the goal of the given joint.
    pub fn set_goal(&mut self, joint: JointType, goal: f64) {
        if let Some(info) = self.get_mut(joint) {
            info.goal = goal;
        }
    }

    /// Snap every joint's goal to its current value.
    ///
    /// Writing the current values back as goals brings the whole arm to a
    /// halt, which is the only way of stopping a position-controlled driver.
    pub fn snap_goals_to_current(&mut self) {
        for info in self.joints.values_mut() {
            info.goal = info.value;
        }
    }

    /// Update the joint tolerances.
    pub fn set_tolerances(&mut self, pan_deg: f64, tilt_deg: f64, gripper_pct: f64) {
        if let Some(info) = self.get_mut(JointType::Pan) {
            info.tol = pan_deg;
        }
        if let Some(info) = self.get_mut(JointType::Tilt) {
            info.tol = tilt_deg;
        }
        if let Some(info) = self.get_mut(JointType::Gripper) {
            info.tol = gripper_pct;
        }
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
    fn test_conversion() {
        let reg = JointRegistry::from_params(&test_params());

        // Pan: radians to degrees with zero offset
        let pan = reg.convert_to_human(JointType::Pan, std::f64::consts::FRAC_PI_2);
        assert!((pan - 90.0).abs() < 1e-9);

        // Tilt: radians to degrees with a 90 degree offset
        let tilt = reg.convert_to_human(JointType::Tilt, 0.0);
        assert!((tilt - 90.0).abs() < 1e-9);

        // Gripper: driver millimetres to percent open
        let grip = reg.convert_to_human(JointType::Gripper, 12.5);
        assert!((grip - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_gripper_sentinel_bypasses_conversion() {
        let reg = JointRegistry::from_params(&test_params());

        // The sentinel must pass through unconverted, preserving the
        // uncalibrated flag
        assert_eq!(reg.convert_to_human(JointType::Gripper, GRIPPER_CAL), GRIPPER_CAL);
    }

    #[test]
    fn test_is_at_target_wraparound() {
        let mut reg = JointRegistry::from_params(&test_params());

        reg.get_mut(JointType::Pan).unwrap().value = 179.0;
        assert!(reg.is_at_target(JointType::Pan, -179.0));

        reg.get_mut(JointType::Pan).unwrap().value = -179.0;
        assert!(reg.is_at_target(JointType::Pan, 179.0));

        reg.get_mut(JointType::Pan).unwrap().value = 90.0;
        assert!(!reg.is_at_target(JointType::Pan, -90.0));
    }

    #[test]
    fn test_is_stowed() {
        let mut reg = JointRegistry::from_params(&test_params());

        reg.get_mut(JointType::Pan).unwrap().value = PAN_STOW_DEG;
        reg.get_mut(JointType::Tilt).unwrap().value = TILT_STOW_DEG;
        assert!(reg.is_stowed());

        reg.get_mut(JointType::Tilt).unwrap().value = 0.0;
        assert!(!reg.is_stowed());
    }

    #[test]
    fn test_requires_closing() {
        let mut reg = JointRegistry::from_params(&test_params());

        // Uncalibrated gripper never requires closing
        reg.get_mut(JointType::Gripper).unwrap().value = GRIPPER_CAL;
        assert!(!reg.requires_closing());

        // Calibrated and away from the stow opening requires closing
        reg.get_mut(JointType::Gripper).unwrap().value = 50.0;
        assert!(reg.requires_closing());

        // Calibrated and already at the stow opening doesn't
        reg.get_mut(JointType::Gripper).unwrap().value = GRIPPER_STOW_PCT;
        assert!(!reg.requires_closing());
    }

    #[test]
    fn test_snap_goals() {
        let mut reg = JointRegistry::from_params(&test_params());

        reg.get_mut(JointType::Pan).unwrap().value = 12.0;
        reg.get_mut(JointType::Tilt).unwrap().value = 34.0;
        reg.set_goal(JointType::Pan, 90.0);
        reg.set_goal(JointType::Tilt, 90.0);

        reg.snap_goals_to_current();

        assert_eq!(reg.goal(JointType::Pan), 12.0);
        assert_eq!(reg.goal(JointType::Tilt), 34.0);
    }
}
