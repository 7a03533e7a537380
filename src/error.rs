use thiserror::Error;

/// Main error type for the master agent
#[derive(Error, Debug)]
pub enum MasterError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // State store errors
    #[error("State store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("State store unavailable")]
    StoreUnavailable,

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Sub-agent errors
    #[error("Agent {agent_id} failed to start: {reason}")]
    AgentStart { agent_id: String, reason: String },

    #[error("Agent {agent_id} cycle failure: {reason}")]
    AgentCycle { agent_id: String, reason: String },

    // Supervisor errors
    #[error("Supervision cycle failure: {0}")]
    Cycle(String),

    #[error("Invalid state transition: from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for MasterError
pub type Result<T> = std::result::Result<T, MasterError>;
