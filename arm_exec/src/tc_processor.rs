//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::de::DeserializeOwned;

// Internal
use arm_lib::arm_ctrl::ArmTcRequest;
use arm_lib::data_store::DataStore;
use comms_if::arm::ArmState;
use comms_if::tc::arm_ctrl::{ArmCmd, ArmTolerances};
use comms_if::tc::{Tc, TcPayload, TcType};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules. A TC with a
/// payload which cannot be interpreted is forwarded as an invalid request,
/// so that the arm reports it on the result channel.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) {
    // Handle different Tcs
    match tc.tc_type {
        TcType::None | TcType::Heartbeat => (),
        TcType::Arm => {
            ds.arm_ctrl_input.cmd = Some(match parse_payload::<ArmCmd>(tc) {
                Some(cmd) => {
                    debug!("Recieved a new arm command: {:?}", cmd);
                    ArmTcRequest::Goal(cmd)
                }
                None => ArmTcRequest::Invalid,
            });
        }
        TcType::ArmSetState => {
            ds.arm_ctrl_input.cmd = Some(match parse_payload::<ArmState>(tc) {
                Some(state) => {
                    debug!("Recieved an arm state override to {:?}", state);
                    ArmTcRequest::SetState(state)
                }
                None => ArmTcRequest::Invalid,
            });
        }
        TcType::ArmSetTolerances => {
            ds.arm_ctrl_input.cmd = Some(match parse_payload::<ArmTolerances>(tc) {
                Some(tols) => ArmTcRequest::SetTolerances(tols),
                None => ArmTcRequest::Invalid,
            });
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse a TC's JSON payload into the given type, or `None` with a warning
/// if the payload is missing or malformed.
fn parse_payload<T: DeserializeOwned>(tc: &Tc) -> Option<T> {
    match &tc.payload {
        TcPayload::Json(s) => match serde_json::from_str(s) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Could not parse the {:?} TC payload: {}", tc.tc_type, e);
                None
            }
        },
        TcPayload::None => {
            warn!("{:?} TC is missing its payload", tc.tc_type);
            None
        }
    }
}
