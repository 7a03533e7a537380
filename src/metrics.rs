//! System-wide supervision metrics.
//!
//! A single writer (the supervisor loop) recomputes these once per cycle;
//! everything else reads snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Smoothing factor for the performance score moving average
const PERFORMANCE_EMA_ALPHA: f64 = 0.2;

/// Aggregate health of the whole ecosystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Wall-clock seconds since the supervision loop started
    pub uptime_secs: u64,
    /// Fraction of agents that completed the last cycle cleanly, in [0, 1]
    pub success_rate: f64,
    /// Total failures observed this run; never decremented
    pub error_count: u64,
    /// When the supervisor last finished a cycle
    pub last_active: DateTime<Utc>,
    /// Moving average of cycle success rates; 0 until the first cycle
    pub performance_score: f64,
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self {
            uptime_secs: 0,
            success_rate: 1.0,
            error_count: 0,
            last_active: Utc::now(),
            performance_score: 0.0,
        }
    }
}

/// Sole writer of [`SystemMetrics`].
pub struct MetricsAggregator {
    started_at: Instant,
    cycles: u64,
    metrics: SystemMetrics,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            cycles: 0,
            metrics: SystemMetrics::default(),
        }
    }

    /// Reset the uptime anchor to now. Called once when the loop starts.
    pub fn mark_started(&mut self) {
        self.started_at = Instant::now();
    }

    /// Record one agent-level or cycle-level failure.
    pub fn record_error(&mut self) {
        self.metrics.error_count += 1;
    }

    /// Fold one completed cycle into the aggregate. `failed` counts agents
    /// that did not get through monitor+update cleanly.
    pub fn record_cycle(&mut self, failed: usize, total: usize) {
        let rate = if total == 0 {
            1.0
        } else {
            (total - failed.min(total)) as f64 / total as f64
        };

        self.cycles += 1;
        self.metrics.success_rate = rate;
        self.metrics.performance_score = if self.cycles == 1 {
            rate
        } else {
            PERFORMANCE_EMA_ALPHA * rate
                + (1.0 - PERFORMANCE_EMA_ALPHA) * self.metrics.performance_score
        };
        self.metrics.uptime_secs = self.started_at.elapsed().as_secs();
        self.metrics.last_active = Utc::now();
    }

    /// Completed cycle count for this run.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn metrics(&self) -> &SystemMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_agents_is_full_success() {
        let mut agg = MetricsAggregator::new();
        agg.record_cycle(0, 0);
        assert_eq!(agg.metrics().success_rate, 1.0);
        assert_eq!(agg.metrics().performance_score, 1.0);
    }

    #[test]
    fn test_performance_score_starts_at_zero() {
        let agg = MetricsAggregator::new();
        assert_eq!(agg.metrics().performance_score, 0.0);
    }

    #[test]
    fn test_success_rate_tracks_failures() {
        let mut agg = MetricsAggregator::new();
        agg.record_cycle(1, 4);
        assert_eq!(agg.metrics().success_rate, 0.75);

        agg.record_cycle(4, 4);
        assert_eq!(agg.metrics().success_rate, 0.0);
        // EMA drags the score down without zeroing it
        assert!(agg.metrics().performance_score > 0.0);
        assert!(agg.metrics().performance_score < 0.75);
    }

    #[test]
    fn test_error_count_is_monotone() {
        let mut agg = MetricsAggregator::new();
        agg.record_error();
        agg.record_error();
        agg.record_cycle(0, 2);
        assert_eq!(agg.metrics().error_count, 2);
    }
}
