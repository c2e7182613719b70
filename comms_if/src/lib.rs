//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the arm software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm behaviour state and result definitions
pub mod arm;

/// Command and response definitions for equipment (like the joint driver)
pub mod eqpt;

/// Network module
pub mod net;

/// Telecommand module
pub mod tc;
