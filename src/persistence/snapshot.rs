//! Serializable system state written to the store once per cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics::SystemMetrics;
use crate::registry::AgentSnapshot;

/// One persisted snapshot of the whole ecosystem.
///
/// The supervisor state travels as its display string so the document stays
/// readable from SQL without the crate's enums at hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Identifies the process run that wrote this snapshot
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub supervisor_state: String,
    pub agents: Vec<AgentSnapshot>,
    pub metrics: SystemMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AgentStatus;

    #[test]
    fn test_snapshot_serializes_agent_rows() {
        let snap = StateSnapshot {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            supervisor_state: "running".to_string(),
            agents: vec![AgentSnapshot {
                id: "paper-crypto".to_string(),
                status: AgentStatus::Running,
                last_heartbeat: Utc::now(),
            }],
            metrics: SystemMetrics::default(),
        };

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["supervisor_state"], "running");
        assert_eq!(json["agents"][0]["status"], "running");
        assert_eq!(json["metrics"]["error_count"], 0);
    }
}
