//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod arm_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json::{self, json, Value};
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the arm exec by the ground
/// station.
#[derive(Debug, Serialize, Deserialize)]
pub struct Tc {
    /// The type of the telecommand
    pub tc_type: TcType,

    /// The payload associated with this TC
    pub payload: TcPayload,
}

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static TYPE_HAS_NO_PAYLOAD: [TcType; 2] = [TcType::None, TcType::Heartbeat];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Telecommand types.
///
/// The type is used to identify the purpose of the telecommand, and should be
/// used by the exec's telecommand processor to determine where to send the
/// command.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub enum TcType {
    None,
    Heartbeat,
    Arm,
    ArmSetState,
    ArmSetTolerances,
}

/// Telecommand payload.
///
/// The payload allows the data contained in the TC to be serialised in many
/// ways. The payload only indicates which serialisation format the data is in.
/// It is up to the user to properly deserialise the data contained within it.
#[derive(Debug, Serialize, Deserialize)]
pub enum TcPayload {
    None,
    Json(String),
}

/// Response to a telecommand, sent back to the commander.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub enum TcResponse {
    /// The TC was accepted for execution
    Ok,

    /// The TC could not be parsed
    Invalid,

    /// The TC was recognised but cannot be executed right now
    CannotExecute,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC has an invalid type ({0})")]
    InvalidType(String),

    #[error("TC of type {0:?} is expected to have a payload but it doesn't")]
    MissingPayload(TcType),

    #[error("Could not serialise the TC payload: {0}")]
    PayloadSerialiseError(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        // Parse the JSON string into a value
        let val: Value = match serde_json::from_str(json_str) {
            Ok(v) => v,
            Err(e) => return Err(TcParseError::InvalidJson(e)),
        };

        // Get the type of the TC
        let tc_type = match TcType::from_str(match val["type"].as_str() {
            Some(s) => s,
            None => {
                return Err(TcParseError::InvalidType(String::from(
                    "Expected \"type\" to be a string",
                )))
            }
        }) {
            Some(t) => t,
            None => {
                return Err(TcParseError::InvalidType(format!(
                    "{} is not a recognised TC type",
                    val["type"].as_str().unwrap_or("")
                )))
            }
        };

        // Get the payload. If it's null and the type does not have a payload
        // then an error is returned
        if val["payload"].is_null() {
            if !TYPE_HAS_NO_PAYLOAD.contains(&tc_type) {
                return Err(TcParseError::MissingPayload(tc_type));
            }

            return Ok(Tc {
                tc_type,
                payload: TcPayload::None,
            });
        }

        Ok(Tc {
            tc_type,
            payload: TcPayload::Json(val["payload"].to_string()),
        })
    }

    /// Serialise the TC into a JSON packet which `from_json` can parse.
    pub fn to_json(&self) -> Result<String, TcParseError> {
        let payload_val = match &self.payload {
            TcPayload::None => Value::Null,
            TcPayload::Json(s) => {
                serde_json::from_str(s).map_err(TcParseError::InvalidJson)?
            }
        };

        Ok(json!({
            "type": self.tc_type.as_str(),
            "payload": payload_val
        })
        .to_string())
    }

    /// Build an arm goal TC from the given command.
    pub fn arm(cmd: &arm_ctrl::ArmCmd) -> Result<Self, TcParseError> {
        Ok(Tc {
            tc_type: TcType::Arm,
            payload: TcPayload::Json(
                serde_json::to_string(cmd).map_err(TcParseError::PayloadSerialiseError)?,
            ),
        })
    }

    /// Build a manual state override TC.
    pub fn arm_set_state(state: &crate::arm::ArmState) -> Result<Self, TcParseError> {
        Ok(Tc {
            tc_type: TcType::ArmSetState,
            payload: TcPayload::Json(
                serde_json::to_string(state).map_err(TcParseError::PayloadSerialiseError)?,
            ),
        })
    }

    /// Build a tolerance reconfiguration TC.
    pub fn arm_set_tolerances(tols: &arm_ctrl::ArmTolerances) -> Result<Self, TcParseError> {
        Ok(Tc {
            tc_type: TcType::ArmSetTolerances,
            payload: TcPayload::Json(
                serde_json::to_string(tols).map_err(TcParseError::PayloadSerialiseError)?,
            ),
        })
    }
}

impl TcType {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "NONE" => Some(TcType::None),
            "HEARTBEAT" => Some(TcType::Heartbeat),
            "ARM" => Some(TcType::Arm),
            "ARM_SET_STATE" => Some(TcType::ArmSetState),
            "ARM_SET_TOLERANCES" => Some(TcType::ArmSetTolerances),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            TcType::None => "NONE",
            TcType::Heartbeat => "HEARTBEAT",
            TcType::Arm => "ARM",
            TcType::ArmSetState => "ARM_SET_STATE",
            TcType::ArmSetTolerances => "ARM_SET_TOLERANCES",
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::arm_ctrl::ArmCmd;
    use super::*;

    #[test]
    fn test_parse_arm_tc() {
        let tc = Tc::from_json(r#"{"type": "ARM", "payload": {"Move": {"pan_deg": 10.0, "tilt_deg": 45.0}}}"#)
            .expect("valid TC should parse");

        assert_eq!(tc.tc_type, TcType::Arm);

        let cmd: ArmCmd = match tc.payload {
            TcPayload::Json(ref s) => serde_json::from_str(s).expect("payload should parse"),
            TcPayload::None => panic!("expected a payload"),
        };

        match cmd {
            ArmCmd::Move { pan_deg, tilt_deg } => {
                assert_eq!(pan_deg, 10.0);
                assert_eq!(tilt_deg, 45.0);
            }
            _ => panic!("expected a Move command"),
        }
    }

    #[test]
    fn test_parse_errors() {
        // Missing payload on a type which requires one
        assert!(matches!(
            Tc::from_json(r#"{"type": "ARM"}"#),
            Err(TcParseError::MissingPayload(TcType::Arm))
        ));

        // Unknown type
        assert!(matches!(
            Tc::from_json(r#"{"type": "WARP_DRIVE", "payload": 1}"#),
            Err(TcParseError::InvalidType(_))
        ));

        // Invalid JSON
        assert!(matches!(
            Tc::from_json("not json"),
            Err(TcParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_round_trip() {
        let tc = Tc::arm(&ArmCmd::Deploy).unwrap();
        let json = tc.to_json().unwrap();
        let parsed = Tc::from_json(&json).unwrap();

        assert_eq!(parsed.tc_type, TcType::Arm);
    }
}
