//! Sub-agent implementations and the contract they implement.
//!
//! Strategy logic itself lives behind the [`SubAgent`] trait; the supervisor
//! only sees capability flags and the start/monitor/update surface.

pub mod paper;
pub mod traits;

pub use paper::{PaperStrategyAgent, PaperStrategyConfig};
pub use traits::{AgentCapabilities, SubAgent};

#[cfg(test)]
pub use traits::MockSubAgent;
