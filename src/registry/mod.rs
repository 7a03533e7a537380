//! Sub-Agent Registry — authoritative map of supervised agents.
//!
//! The registry owns every agent handle and is the only writer of agent
//! status fields. Iteration order is stable within a process run
//! (insertion order), which the supervisor relies on for deterministic
//! startup and cycling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::agents::SubAgent;

// =============================================================================
// AgentStatus — lifecycle state machine
// =============================================================================

/// Lifecycle states of a supervised sub-agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Initializing,
    Ready,
    Running,
    Paused,
    Error,
    Terminated,
}

impl AgentStatus {
    /// Valid next states from the current status.
    pub fn valid_transitions(self) -> &'static [AgentStatus] {
        use AgentStatus::*;
        match self {
            Initializing => &[Ready, Error, Terminated],
            Ready => &[Running, Paused, Error, Terminated],
            Running => &[Paused, Error, Terminated],
            Paused => &[Running, Error, Terminated],
            Error => &[Ready, Terminated],
            Terminated => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed. Writing the same
    /// status again is always a valid no-op.
    pub fn can_transition_to(self, next: AgentStatus) -> bool {
        self == next || self.valid_transitions().contains(&next)
    }

    /// Terminated is the only terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentStatus::Terminated)
    }

    /// Whether the supervisor should drive this agent's update cycle.
    pub fn is_updatable(self) -> bool {
        !matches!(self, AgentStatus::Paused | AgentStatus::Terminated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Error => "error",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// AgentHandle — registry entry
// =============================================================================

/// A registered sub-agent together with its supervision metadata.
#[derive(Clone)]
pub struct AgentHandle {
    pub id: String,
    pub agent: Arc<dyn SubAgent>,
    pub status: AgentStatus,
    pub registered_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
}

impl fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentHandle")
            .field("id", &self.id)
            .field("agent", &self.agent.name())
            .field("status", &self.status)
            .field("registered_at", &self.registered_at)
            .field("last_heartbeat", &self.last_heartbeat)
            .finish()
    }
}

/// Serializable per-agent row embedded in persisted state snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: String,
    pub status: AgentStatus,
    pub last_heartbeat: DateTime<Utc>,
}

// =============================================================================
// AgentRegistry
// =============================================================================

#[derive(Default)]
struct RegistryInner {
    handles: HashMap<String, AgentHandle>,
    // Insertion order; an overwrite keeps the original position
    order: Vec<String>,
}

/// Registry of supervised sub-agents.
#[derive(Default)]
pub struct AgentRegistry {
    inner: RwLock<RegistryInner>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sub-agent under `id`.
    ///
    /// Empty identifiers are rejected. Registering an id that already
    /// exists replaces the handle (status back to `Ready`, fresh
    /// registration timestamp) and logs the overwrite.
    pub async fn register(&self, id: &str, agent: Arc<dyn SubAgent>) -> bool {
        let id = id.trim();
        if id.is_empty() {
            error!("Invalid agent id provided (empty)");
            return false;
        }

        let now = Utc::now();
        let handle = AgentHandle {
            id: id.to_string(),
            agent,
            status: AgentStatus::Ready,
            registered_at: now,
            last_heartbeat: now,
        };

        let mut inner = self.inner.write().await;
        if inner.handles.insert(id.to_string(), handle).is_some() {
            warn!("Agent {} already registered. Updating.", id);
        } else {
            inner.order.push(id.to_string());
        }

        true
    }

    /// Look up a single agent handle.
    pub async fn get(&self, id: &str) -> Option<AgentHandle> {
        let inner = self.inner.read().await;
        inner.handles.get(id).cloned()
    }

    /// All handles in stable insertion order.
    pub async fn all(&self) -> Vec<AgentHandle> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.handles.get(id).cloned())
            .collect()
    }

    /// Registered ids in stable insertion order.
    pub async fn ids(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        inner.order.clone()
    }

    /// Update an agent's status. Only the supervisor calls this.
    ///
    /// Transitions not allowed by [`AgentStatus::valid_transitions`] are
    /// logged and ignored.
    pub async fn set_status(&self, id: &str, status: AgentStatus) -> bool {
        let mut inner = self.inner.write().await;
        match inner.handles.get_mut(id) {
            Some(handle) => {
                if !handle.status.can_transition_to(status) {
                    warn!(
                        "Rejected status transition for agent {}: {} -> {}",
                        id, handle.status, status
                    );
                    return false;
                }
                handle.status = status;
                true
            }
            None => {
                warn!("Status update for unknown agent {}", id);
                false
            }
        }
    }

    /// Refresh an agent's liveness timestamp.
    pub async fn record_heartbeat(&self, id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(handle) = inner.handles.get_mut(id) {
            handle.last_heartbeat = Utc::now();
        }
    }

    /// Serializable rows for the persistence snapshot, in insertion order.
    pub async fn snapshot(&self) -> Vec<AgentSnapshot> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.handles.get(id))
            .map(|h| AgentSnapshot {
                id: h.id.clone(),
                status: h.status,
                last_heartbeat: h.last_heartbeat,
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.handles.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentCapabilities;
    use async_trait::async_trait;

    struct NullAgent {
        name: &'static str,
    }

    #[async_trait]
    impl SubAgent for NullAgent {
        fn name(&self) -> &str {
            self.name
        }

        fn capabilities(&self) -> AgentCapabilities {
            AgentCapabilities::default()
        }
    }

    fn agent(name: &'static str) -> Arc<dyn SubAgent> {
        Arc::new(NullAgent { name })
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = AgentRegistry::new();
        assert!(registry.register("momentum-btc", agent("momentum")).await);

        let handle = registry.get("momentum-btc").await.unwrap();
        assert_eq!(handle.status, AgentStatus::Ready);
        assert_eq!(handle.agent.name(), "momentum");
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let registry = AgentRegistry::new();
        assert!(!registry.register("", agent("a")).await);
        assert!(!registry.register("   ", agent("a")).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_overwrite_keeps_one_handle_per_id() {
        let registry = AgentRegistry::new();
        registry.register("a1", agent("first")).await;
        registry.set_status("a1", AgentStatus::Running).await;
        registry.register("a1", agent("second")).await;

        assert_eq!(registry.len().await, 1);
        let handle = registry.get("a1").await.unwrap();
        assert_eq!(handle.agent.name(), "second");
        // Overwrite resets the lifecycle
        assert_eq!(handle.status, AgentStatus::Ready);
    }

    #[tokio::test]
    async fn test_iteration_order_is_insertion_order() {
        let registry = AgentRegistry::new();
        registry.register("c", agent("c")).await;
        registry.register("a", agent("a")).await;
        registry.register("b", agent("b")).await;
        // Overwriting must not move "a" to the back
        registry.register("a", agent("a2")).await;

        assert_eq!(registry.ids().await, vec!["c", "a", "b"]);
        let all: Vec<String> = registry.all().await.into_iter().map(|h| h.id).collect();
        assert_eq!(all, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_status_transitions_enforced() {
        let registry = AgentRegistry::new();
        registry.register("a1", agent("a")).await;

        assert!(registry.set_status("a1", AgentStatus::Running).await);
        assert!(registry.set_status("a1", AgentStatus::Terminated).await);
        // Terminated is terminal
        assert!(!registry.set_status("a1", AgentStatus::Running).await);
        assert_eq!(
            registry.get("a1").await.unwrap().status,
            AgentStatus::Terminated
        );
    }

    #[tokio::test]
    async fn test_same_status_is_noop() {
        let registry = AgentRegistry::new();
        registry.register("a1", agent("a")).await;
        registry.set_status("a1", AgentStatus::Running).await;
        registry.set_status("a1", AgentStatus::Error).await;
        // A failing agent keeps failing; writing Error again is fine
        assert!(registry.set_status("a1", AgentStatus::Error).await);
    }

    #[tokio::test]
    async fn test_heartbeat_refresh() {
        let registry = AgentRegistry::new();
        registry.register("a1", agent("a")).await;
        let before = registry.get("a1").await.unwrap().last_heartbeat;
        registry.record_heartbeat("a1").await;
        let after = registry.get("a1").await.unwrap().last_heartbeat;
        assert!(after >= before);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(AgentStatus::Running.to_string(), "running");
        assert_eq!(AgentStatus::Terminated.to_string(), "terminated");
    }

    #[test]
    fn test_transition_table() {
        assert!(AgentStatus::Initializing.can_transition_to(AgentStatus::Ready));
        assert!(AgentStatus::Ready.can_transition_to(AgentStatus::Running));
        assert!(AgentStatus::Running.can_transition_to(AgentStatus::Error));
        assert!(!AgentStatus::Terminated.can_transition_to(AgentStatus::Ready));
        assert!(AgentStatus::Terminated.is_terminal());
    }
}
