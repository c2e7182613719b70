//! # Telecommand Server
//!
//! Receives telecommands from the ground commander and sends back one
//! response per command.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
    tc::{Tc, TcResponse},
};

use crate::params::ArmExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telecommand server
pub struct TcServer {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TcServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The server has no commander connected")]
    NotConnected,

    #[error("Could not send a response to the commander: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from the commander: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not parse the recieved telecommand: {0}")]
    TcParseError(comms_if::tc::TcParseError),

    #[error("The commander sent a message which was not valid UTF-8")]
    NonUtf8Tc,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TcServer {
    /// Create a new instance of the TC server.
    ///
    /// This function will not block until a commander connects.
    pub fn new(ctx: &zmq::Context, params: &ArmExecParams) -> Result<Self, TcServerError> {
        // Create the socket options
        let socket_options = SocketOptions {
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

        // Connect the socket
        let socket = MonitoredSocket::new(ctx, zmq::REP, socket_options, &params.tc_endpoint)
            .map_err(TcServerError::SocketError)?;

        // Create self
        Ok(Self { socket })
    }

    /// Check if a commander is connected to the server
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }

    /// Recieve a single TC from the commander.
    ///
    /// The protocol here is to call this in a loop until `Ok(None)` is
    /// returned, indicating that there are no more pending TCs to be
    /// recieved right now.
    ///
    /// After recieving a valid TC the caller must send a response using
    /// `.send_response()` before attempting to recieve another TC. If an
    /// error occurs in parsing the TC the response is sent automatically by
    /// this function.
    pub fn recieve_tc(&self) -> Result<Option<Tc>, TcServerError> {
        // Attempt to read a string from the socket
        let tc_str = match self.socket.recv_string(0) {
            // Valid message
            Ok(Ok(s)) => s,
            // Non UTF-8 message
            Ok(Err(_)) => {
                // Send invalid message response
                self.send_response(TcResponse::Invalid)?;

                return Err(TcServerError::NonUtf8Tc);
            }
            // No message in timeout
            Err(zmq::Error::EAGAIN) => return Ok(None),
            // Recieve error
            Err(e) => {
                // No response is sent if we could not recieve
                return Err(TcServerError::RecvError(e));
            }
        };

        // Parse the TC
        Tc::from_json(&tc_str)
            .map_err(|e| {
                // Send the invalid response
                self.send_response(TcResponse::Invalid).ok();

                TcServerError::TcParseError(e)
            })
            .map(Some)
    }

    /// Send the given response back to the commander.
    ///
    /// This function must be called after recieving a TC.
    pub fn send_response(&self, response: TcResponse) -> Result<(), TcServerError> {
        // Serialise the response
        let response_str =
            serde_json::to_string(&response).map_err(TcServerError::SerializationError)?;

        // Send the response
        self.socket
            .send(&response_str, 0)
            .map_err(TcServerError::SendError)
    }
}
