//! # Joint Driver Client
//!
//! This module provides networking abstractions to connect to the low-level
//! joint driver. Demands are published fire-and-forget, one joint at a time,
//! and raw joint state batches are received on a separate subscription.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::joint::{JointDem, JointStateBatch},
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};

use crate::params::ArmExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct DriverClient {
    dems_socket: MonitoredSocket,

    states_socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum DriverClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not subscribe to joint states: {0}")]
    SubscribeError(zmq::Error),

    #[error("Could not send a demand to the driver: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from the driver: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the demand: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the joint states from the driver: {0}")]
    DeserializeError(serde_json::Error),

    #[error("The driver sent a message which was not valid UTF-8")]
    NonUtf8Message,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriverClient {
    /// Create a new instance of the driver client.
    ///
    /// This function will not block until the driver connects.
    pub fn new(ctx: &zmq::Context, params: &ArmExecParams) -> Result<Self, DriverClientError> {
        // Create the socket options
        let dems_socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };
        let states_socket_options = SocketOptions {
            bind: true,
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 0,
            send_timeout: 10,
            ..Default::default()
        };

        // Create the sockets
        let dems_socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            dems_socket_options,
            &params.joint_dems_endpoint,
        )
        .map_err(DriverClientError::SocketError)?;
        let states_socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            states_socket_options,
            &params.joint_states_endpoint,
        )
        .map_err(DriverClientError::SocketError)?;

        // Subscribe to all joint state messages
        states_socket
            .set_subscribe(b"")
            .map_err(DriverClientError::SubscribeError)?;

        // Create self
        Ok(Self {
            dems_socket,
            states_socket,
        })
    }

    /// Check if the driver is connected to the demand channel.
    pub fn is_connected(&self) -> bool {
        self.dems_socket.connected()
    }

    /// Publish a single joint demand to the driver.
    ///
    /// Demands are fire-and-forget, completion is only ever detected through
    /// subsequent joint state feedback.
    pub fn send_demand(&mut self, dem: &JointDem) -> Result<(), DriverClientError> {
        // Serialize the demand
        let dem_str =
            serde_json::to_string(dem).map_err(DriverClientError::SerializationError)?;

        // Send the demand to the driver
        self.dems_socket
            .send(&dem_str, 0)
            .map_err(DriverClientError::SendError)
    }

    /// Recieve a single joint state batch from the driver.
    ///
    /// The protocol here is to call this in a loop until `Ok(None)` is
    /// returned, indicating that there are no more pending batches right
    /// now.
    pub fn recieve_joint_states(&mut self) -> Result<Option<JointStateBatch>, DriverClientError> {
        // Attempt to read a string from the socket
        let batch_str = match self.states_socket.recv_string(0) {
            // Valid message
            Ok(Ok(s)) => s,
            // Non UTF-8 message
            Ok(Err(_)) => return Err(DriverClientError::NonUtf8Message),
            // No message waiting
            Err(zmq::Error::EAGAIN) => return Ok(None),
            // Recieve error
            Err(e) => return Err(DriverClientError::RecvError(e)),
        };

        // Parse the batch
        serde_json::from_str(&batch_str)
            .map(Some)
            .map_err(DriverClientError::DeserializeError)
    }
}
