//! SubAgent trait — capability-based contract between the master agent
//! and heterogeneous sub-agents.
//!
//! Sub-agents advertise which lifecycle operations they implement via
//! [`AgentCapabilities`]; the supervisor only invokes an operation when the
//! matching flag is set. Every operation has a no-op default so minimal
//! agents stay minimal.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::Result;

/// Lifecycle operations a sub-agent supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentCapabilities {
    /// Agent wants `start()` during supervisor startup
    pub start: bool,
    /// Agent answers `monitor()` liveness probes
    pub monitor: bool,
    /// Agent runs a strategy-update cycle via `update()`
    pub update: bool,
}

impl AgentCapabilities {
    /// All three lifecycle operations supported.
    pub fn all() -> Self {
        Self {
            start: true,
            monitor: true,
            update: true,
        }
    }

    /// No operations supported (registration-only agent).
    pub fn none() -> Self {
        Self::default()
    }
}

/// A supervised worker unit, typically a trading strategy executor.
///
/// The supervisor drives all calls sequentially from its control loop;
/// implementations may await I/O freely but must not assume concurrent
/// invocation of their own methods.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SubAgent: Send + Sync {
    /// Human-readable name used in logs and snapshots.
    fn name(&self) -> &str;

    /// Which operations the supervisor may invoke on this agent.
    fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities::none()
    }

    /// One-time startup hook, invoked before the first cycle.
    async fn start(&self) -> Result<()> {
        Ok(())
    }

    /// Liveness probe; `Ok` refreshes the agent's heartbeat.
    async fn monitor(&self) -> Result<()> {
        Ok(())
    }

    /// Drive one strategy-update cycle. This is the extension point where
    /// the agent's domain logic runs.
    async fn update(&self) -> Result<()> {
        Ok(())
    }
}
