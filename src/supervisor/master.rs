//! Master Agent — core orchestrator of the trading ecosystem.
//!
//! Owns the sub-agent registry, the state store, and the supervision loop:
//!
//! ```text
//! start agents → [ monitor → update → persist → metrics → sleep ] → terminate
//! ```
//!
//! Failure isolation is layered: agent-level failures mark the agent and
//! keep the cycle going; cycle-level failures are caught at the loop
//! boundary and answered with a bounded backoff; only errors escaping even
//! that boundary take the process down.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::agents::SubAgent;
use crate::config::AppConfig;
use crate::coordination::ShutdownController;
use crate::error::Result;
use crate::metrics::{MetricsAggregator, SystemMetrics};
use crate::persistence::{StateSnapshot, StateStore};
use crate::registry::{AgentRegistry, AgentStatus};

/// Pause after a cycle-level failure, kept well under the default polling
/// interval so one bad cycle cannot stall supervision for long.
const CYCLE_ERROR_BACKOFF: Duration = Duration::from_secs(5);
const CYCLE_ERROR_JITTER_MS: u64 = 1_000;

// =============================================================================
// SupervisorState
// =============================================================================

/// Lifecycle states of the supervisor itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Initializing,
    Running,
    Error,
    Terminated,
}

impl SupervisorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SupervisorState::Error | SupervisorState::Terminated)
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Initializing => write!(f, "initializing"),
            SupervisorState::Running => write!(f, "running"),
            SupervisorState::Error => write!(f, "error"),
            SupervisorState::Terminated => write!(f, "terminated"),
        }
    }
}

// =============================================================================
// MasterAgent
// =============================================================================

/// Core orchestrator managing sub-agents, state persistence and metrics.
pub struct MasterAgent {
    config: AppConfig,
    registry: Arc<AgentRegistry>,
    store: StateStore,
    metrics: MetricsAggregator,
    shutdown: Arc<ShutdownController>,
    state: SupervisorState,
    run_id: Uuid,
}

impl MasterAgent {
    pub fn new(config: AppConfig, store: StateStore, shutdown: Arc<ShutdownController>) -> Self {
        let run_id = Uuid::new_v4();
        info!(
            "Master agent initialized (run {}, polling every {}s, persistence: {})",
            run_id,
            config.polling_interval,
            if store.is_connected() { "on" } else { "off" }
        );

        Self {
            config,
            registry: Arc::new(AgentRegistry::new()),
            store,
            metrics: MetricsAggregator::new(),
            shutdown,
            state: SupervisorState::Initializing,
            run_id,
        }
    }

    /// Register a sub-agent for supervision. Delegates to the registry;
    /// see [`AgentRegistry::register`] for the id/overwrite rules.
    pub async fn register_sub_agent(&self, id: &str, agent: Arc<dyn SubAgent>) -> bool {
        let registered = self.registry.register(id, agent).await;
        if registered {
            let count = self.registry.len().await;
            if count > self.config.max_concurrent_strategies as usize {
                warn!(
                    "{} agents registered, exceeding max_concurrent_strategies ({})",
                    count, self.config.max_concurrent_strategies
                );
            }
            info!("Sub-agent {} registered", id.trim());
        }
        registered
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn metrics(&self) -> &SystemMetrics {
        self.metrics.metrics()
    }

    /// Completed supervision cycles this run.
    pub fn cycles(&self) -> u64 {
        self.metrics.cycles()
    }

    pub fn registry(&self) -> Arc<AgentRegistry> {
        self.registry.clone()
    }

    /// Start every registered agent that exposes a start hook, in
    /// registration order. One agent failing to start never aborts the
    /// others; it is marked [`AgentStatus::Error`] and counted.
    pub async fn start_sub_agents(&mut self) {
        for handle in self.registry.all().await {
            if !handle.agent.capabilities().start {
                info!("Agent {} has no start hook, skipping", handle.id);
                continue;
            }

            match handle.agent.start().await {
                Ok(()) => {
                    self.registry
                        .set_status(&handle.id, AgentStatus::Running)
                        .await;
                    info!("Started sub-agent: {}", handle.id);
                }
                Err(e) => {
                    error!("Failed to start agent {}: {}", handle.id, e);
                    self.registry
                        .set_status(&handle.id, AgentStatus::Error)
                        .await;
                    self.metrics.record_error();
                }
            }
        }
    }

    /// Drive one supervision cycle: monitor → update → persist → metrics.
    ///
    /// Normally invoked by [`run`](Self::run); public so a cycle can be
    /// exercised deterministically without the loop's sleeps.
    pub async fn run_cycle(&mut self) -> Result<()> {
        let total = self.registry.len().await;
        let mut failed = HashSet::new();

        self.monitor_sub_agents(&mut failed).await;
        self.update_sub_agents(&mut failed).await;
        self.persist_state().await;
        self.metrics.record_cycle(failed.len(), total);

        Ok(())
    }

    /// Run the supervision loop until a stop is requested or a fatal error
    /// escapes the cycle boundary.
    pub async fn run(&mut self) -> Result<()> {
        self.state = SupervisorState::Running;
        self.metrics.mark_started();
        info!("Master agent entering main execution loop");

        self.recover_previous_context().await;
        self.start_sub_agents().await;

        match self.supervise().await {
            Ok(()) => {
                self.state = SupervisorState::Terminated;
                self.write_final_snapshot().await;
                self.store.close().await;
                info!("Master agent terminated cleanly");
                Ok(())
            }
            Err(e) => {
                error!("Fatal error in master agent: {}", e);
                self.state = SupervisorState::Error;
                self.store.close().await;
                Err(e)
            }
        }
    }

    async fn supervise(&mut self) -> Result<()> {
        loop {
            if self.shutdown.is_stop_requested() {
                info!("Stop flag observed, exiting supervision loop");
                return Ok(());
            }

            if let Err(e) = self.run_cycle().await {
                error!("Error in supervision cycle: {}", e);
                self.metrics.record_error();
                self.backoff().await;
                continue;
            }

            // A stop that arrived mid-cycle takes effect here, after the
            // cycle's persistence step but before any new cycle.
            if self.shutdown.is_stop_requested() {
                info!("Stop requested during cycle, not starting another");
                return Ok(());
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.polling_duration()) => {}
                _ = self.shutdown.cancelled() => {}
            }
        }
    }

    async fn monitor_sub_agents(&mut self, failed: &mut HashSet<String>) {
        for handle in self.registry.all().await {
            if handle.status.is_terminal() {
                continue;
            }

            if !handle.agent.capabilities().monitor {
                // No probe to run; the reference itself counts as alive
                self.registry.record_heartbeat(&handle.id).await;
                continue;
            }

            match handle.agent.monitor().await {
                Ok(()) => self.registry.record_heartbeat(&handle.id).await,
                Err(e) => {
                    warn!("Heartbeat failure from agent {}: {}", handle.id, e);
                    self.registry
                        .set_status(&handle.id, AgentStatus::Error)
                        .await;
                    self.metrics.record_error();
                    failed.insert(handle.id.clone());
                }
            }
        }
    }

    async fn update_sub_agents(&mut self, failed: &mut HashSet<String>) {
        for handle in self.registry.all().await {
            if !handle.status.is_updatable() {
                continue;
            }

            if !handle.agent.capabilities().update {
                debug!("Agent {} has no update hook, skipping", handle.id);
                continue;
            }

            if let Err(e) = handle.agent.update().await {
                error!("Strategy update failed for agent {}: {}", handle.id, e);
                self.registry
                    .set_status(&handle.id, AgentStatus::Error)
                    .await;
                self.metrics.record_error();
                failed.insert(handle.id.clone());
            }
        }
    }

    async fn persist_state(&mut self) {
        if !self.store.is_connected() {
            return;
        }

        let snapshot = self.build_snapshot().await;
        if let Err(e) = self.store.save_snapshot(&snapshot).await {
            warn!("State snapshot write failed: {}", e);
            self.metrics.record_error();
        }
    }

    async fn build_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            run_id: self.run_id,
            created_at: Utc::now(),
            supervisor_state: self.state.to_string(),
            agents: self.registry.snapshot().await,
            metrics: self.metrics.metrics().clone(),
        }
    }

    async fn recover_previous_context(&self) {
        if !self.store.is_connected() {
            return;
        }

        match self.store.load_latest().await {
            Ok(Some(prev)) => info!(
                "Previous run {} last persisted at {}",
                prev.run_id, prev.created_at
            ),
            Ok(None) => debug!("No previous state snapshot found"),
            Err(e) => warn!("Could not load previous state snapshot: {}", e),
        }
    }

    async fn write_final_snapshot(&mut self) {
        if !self.store.is_connected() {
            return;
        }

        let snapshot = self.build_snapshot().await;
        match self.store.save_snapshot(&snapshot).await {
            Ok(id) => debug!("Final state snapshot {} written", id),
            Err(e) => warn!("Final state snapshot failed: {}", e),
        }
    }

    async fn backoff(&self) {
        let jitter = rand::thread_rng().gen_range(0..CYCLE_ERROR_JITTER_MS);
        let pause = CYCLE_ERROR_BACKOFF + Duration::from_millis(jitter);
        warn!("Backing off {:?} before next cycle", pause);

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = self.shutdown.cancelled() => {}
        }
    }
}
