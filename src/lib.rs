pub mod agents;
pub mod cli;
pub mod config;
pub mod coordination;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod persistence;
pub mod registry;
pub mod supervisor;

pub use agents::{AgentCapabilities, PaperStrategyAgent, PaperStrategyConfig, SubAgent};
pub use config::{AppConfig, MarketType};
pub use coordination::{install_signal_handlers, ShutdownController};
pub use error::{MasterError, Result};
pub use metrics::{MetricsAggregator, SystemMetrics};
pub use persistence::{StateSnapshot, StateStore};
pub use registry::{AgentHandle, AgentRegistry, AgentSnapshot, AgentStatus};
pub use supervisor::{MasterAgent, SupervisorState};
