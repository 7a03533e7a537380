//! Supervision Layer
//!
//! The master agent control loop and its lifecycle state machine.

pub mod master;

pub use master::{MasterAgent, SupervisorState};
