//! # Joint Driver Equipment Interface
//!
//! Messages exchanged with the low-level joint driver. Demands are expressed
//! in the driver's native units, state samples are raw driver readings which
//! the arm exec converts into human units.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A position demand for a single joint, sent to the joint driver.
///
/// Demands are always issued one joint at a time, the driver never receives
/// batched demands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointDem {
    /// The low-level name of the joint
    pub name: String,

    /// The demanded position in driver units
    pub pos: f64,
}

/// One raw joint state sample produced by the joint driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawJointSample {
    /// The low-level name of the joint
    pub name: String,

    /// Position in driver units
    pub pos: f64,

    /// Velocity in SI units
    pub vel: f64,

    /// Motor effort (current) in SI units
    pub effort: f64,
}

/// A batch of raw joint state samples from the joint driver.
///
/// Batches may be partial and may contain joints which are not known to the
/// arm exec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointStateBatch {
    /// Driver-side acquisition time of the batch
    pub timestamp: DateTime<Utc>,

    /// The samples in this batch
    pub samples: Vec<RawJointSample>,
}

/// A derived joint sample in human units, published for external monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointSample {
    /// The generic name of the joint ("pan", "tilt" or "gripper")
    pub name: String,

    /// Position in human units (degrees, or percent open for the gripper)
    pub angle_pos: f64,

    /// Velocity in SI units
    pub angle_vel: f64,

    /// Motor current in SI units
    pub current: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointStateBatch {
    /// Create a new empty batch stamped with the current time.
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            samples: Vec::new(),
        }
    }
}

impl Default for JointStateBatch {
    fn default() -> Self {
        Self::new()
    }
}
