//! Paper-trading strategy agent.
//!
//! A stand-in strategy executor that exercises the full sub-agent contract
//! without touching any exchange. Real strategies replace the body of
//! `update()`; everything else (capability flags, start/monitor plumbing)
//! is what a production agent looks like to the supervisor.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info};

use crate::agents::{AgentCapabilities, SubAgent};
use crate::config::MarketType;
use crate::error::{MasterError, Result};

/// Parameters for a paper strategy instance
#[derive(Debug, Clone)]
pub struct PaperStrategyConfig {
    /// Market this instance trades
    pub market: MarketType,
    /// Fraction of bankroll a single position may risk
    pub risk_tolerance: f64,
    /// Notional bankroll the instance sizes against (USD)
    pub bankroll: Decimal,
}

impl Default for PaperStrategyConfig {
    fn default() -> Self {
        Self {
            market: MarketType::Crypto,
            risk_tolerance: 0.02,
            bankroll: Decimal::from(1_000),
        }
    }
}

/// Dry-run strategy executor supporting the full capability set.
pub struct PaperStrategyAgent {
    name: String,
    config: PaperStrategyConfig,
    started: AtomicBool,
    updates: AtomicU64,
}

impl PaperStrategyAgent {
    pub fn new(config: PaperStrategyConfig) -> Self {
        Self {
            name: format!("paper-{}", config.market),
            config,
            started: AtomicBool::new(false),
            updates: AtomicU64::new(0),
        }
    }

    /// Largest position this instance would open, in USD.
    pub fn max_notional(&self) -> Decimal {
        let risk = Decimal::try_from(self.config.risk_tolerance).unwrap_or(Decimal::ZERO);
        self.config.bankroll * risk
    }

    /// Number of update cycles driven so far.
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubAgent for PaperStrategyAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities::all()
    }

    async fn start(&self) -> Result<()> {
        self.started.store(true, Ordering::SeqCst);
        info!(
            "{} started (market: {}, max notional: ${})",
            self.name,
            self.config.market,
            self.max_notional()
        );
        Ok(())
    }

    async fn monitor(&self) -> Result<()> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(MasterError::AgentCycle {
                agent_id: self.name.clone(),
                reason: "monitor before start".to_string(),
            });
        }
        Ok(())
    }

    async fn update(&self) -> Result<()> {
        let n = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "{} update cycle {}: no actionable signals (paper mode, max notional ${})",
            self.name,
            n,
            self.max_notional()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_paper_agent_lifecycle() {
        let agent = PaperStrategyAgent::new(PaperStrategyConfig::default());

        // Monitoring before start is a liveness failure
        assert!(agent.monitor().await.is_err());

        agent.start().await.unwrap();
        agent.monitor().await.unwrap();
        agent.update().await.unwrap();
        agent.update().await.unwrap();
        assert_eq!(agent.update_count(), 2);
    }

    #[test]
    fn test_max_notional_follows_risk_tolerance() {
        let agent = PaperStrategyAgent::new(PaperStrategyConfig {
            market: MarketType::Forex,
            risk_tolerance: 0.05,
            bankroll: dec!(2000),
        });
        assert_eq!(agent.max_notional(), dec!(100.00));
        assert_eq!(agent.name(), "paper-forex");
    }
}
