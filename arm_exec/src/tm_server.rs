//! # TM Server
//!
//! Publishes the arm state, action results, feedback and joint samples for
//! ground consumption.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comms_if::{
    arm::{ArmFeedback, ArmJointState, ArmResult, ArmState, GripperState, StateNotice},
    eqpt::joint::{JointDem, JointSample},
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};

use crate::arm_ctrl::StatusReport;
use crate::data_store::DataStore;
use crate::params::ArmExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry server
pub struct TmServer {
    socket: MonitoredSocket,
}

/// Telemetry packet that is output by the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct TmPacket {
    /// Time the packet was assembled
    pub timestamp: DateTime<Utc>,

    /// Seconds since the session epoch
    pub elapsed_time_s: f64,

    /// Current full state of the arm state machine
    pub arm_state: ArmState,

    /// Simplified gripper display state
    pub gripper_state: GripperState,

    /// Simplified joint motion display state
    pub joint_state: ArmJointState,

    /// State transitions which occured this cycle
    pub state_changes: Vec<StateNotice>,

    /// Terminal action results concluded this cycle
    pub results: Vec<ArmResult>,

    /// Action feedback snapshot, present while an action is in flight
    pub feedback: Option<ArmFeedback>,

    /// Derived joint samples in human units
    pub joint_samples: Vec<JointSample>,

    /// Joint demands issued to the driver this cycle
    pub joint_dems: Vec<JointDem>,

    /// Full ArmCtrl status report
    pub arm_ctrl_status_rpt: StatusReport,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TmServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send telemetry: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the telemetry: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TmServer {
    /// Create a new instance of the TM Server.
    ///
    /// This function will not block until a subscriber connects.
    pub fn new(ctx: &zmq::Context, params: &ArmExecParams) -> Result<Self, TmServerError> {
        // Create the socket options
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            bind: true,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        // Connect the socket
        let socket = MonitoredSocket::new(ctx, zmq::PUB, socket_options, &params.tm_endpoint)
            .map_err(TmServerError::SocketError)?;

        // Create self
        Ok(Self { socket })
    }

    /// Assemble and publish the TM packet for this cycle.
    pub fn send(&mut self, ds: &DataStore) -> Result<(), TmServerError> {
        // Build packet
        let packet = TmPacket::from_datastore(ds);

        // Serialize packet
        let packet_string =
            serde_json::to_string(&packet).map_err(TmServerError::SerializationError)?;

        // Send the packet
        self.socket
            .send(&packet_string, 0)
            .map_err(TmServerError::SendError)
    }
}

impl TmPacket {
    pub fn from_datastore(ds: &DataStore) -> Self {
        Self {
            timestamp: Utc::now(),
            elapsed_time_s: ds.elapsed_time_s,
            arm_state: ds.arm_ctrl_status_rpt.state,
            gripper_state: ds.arm_ctrl_status_rpt.gripper_state,
            joint_state: ds.arm_ctrl_status_rpt.joint_state,
            state_changes: ds.arm_ctrl_output.state_changes.clone(),
            results: ds.arm_ctrl_output.results.clone(),
            feedback: ds.arm_ctrl_output.feedback,
            joint_samples: ds.arm_ctrl_output.samples.clone(),
            joint_dems: ds.arm_ctrl_output.joint_dems.clone(),
            arm_ctrl_status_rpt: ds.arm_ctrl_status_rpt,
        }
    }
}
