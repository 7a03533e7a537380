//! Coordination Layer
//!
//! Cooperative shutdown plumbing shared between the supervisor loop and the
//! OS signal handlers.

pub mod shutdown;

pub use shutdown::{install_signal_handlers, ShutdownController};
