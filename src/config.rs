use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

/// Market types the ecosystem can trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    Crypto,
    Forex,
    Stocks,
    Futures,
}

impl MarketType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crypto => "crypto",
            Self::Forex => "forex",
            Self::Stocks => "stocks",
            Self::Futures => "futures",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "crypto" => Some(Self::Crypto),
            "forex" => Some(Self::Forex),
            "stocks" => Some(Self::Stocks),
            "futures" => Some(Self::Futures),
            _ => None,
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main configuration structure, immutable after load
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Seconds between supervision cycles
    pub polling_interval: u64,
    /// Upper bound on concurrently deployed strategies
    pub max_concurrent_strategies: u32,
    /// Fraction of capital a single strategy may put at risk
    pub risk_tolerance: f64,
    /// Markets sub-agents are allowed to operate in
    pub markets: Vec<MarketType>,
    /// Log level (trace, debug, info, warn, error)
    pub logging_level: String,
    /// Unrecognized keys are kept for downstream consumers but unused here
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            polling_interval: 60,
            max_concurrent_strategies: 10,
            risk_tolerance: 0.02,
            markets: vec![MarketType::Crypto],
            logging_level: "info".to_string(),
            extra: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional file and environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // Start with default values
            .set_default("polling_interval", 60_i64)?
            .set_default("max_concurrent_strategies", 10_i64)?
            .set_default("risk_tolerance", 0.02)?
            .set_default("markets", vec!["crypto".to_string()])?
            .set_default("logging_level", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        // Override with environment variables (MAESTRO_POLLING_INTERVAL, etc.)
        builder = builder.add_source(
            Environment::with_prefix("MAESTRO")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Load configuration, falling back to defaults instead of failing.
    ///
    /// A missing file is logged at warn and the remaining sources still
    /// apply; malformed content or invalid values are logged at error and
    /// the built-in defaults are used wholesale.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        if let Some(p) = path {
            if !p.exists() {
                warn!("Config file {} not found. Using defaults.", p.display());
            }
        }

        match Self::load(path) {
            Ok(cfg) => match cfg.validate() {
                Ok(()) => {
                    if path.is_some() {
                        info!("Configuration loaded");
                    }
                    cfg
                }
                Err(errors) => {
                    for e in &errors {
                        warn!("Invalid configuration value: {}", e);
                    }
                    warn!("Falling back to default configuration");
                    Self::default()
                }
            },
            Err(e) => {
                error!("Error loading config: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.polling_interval == 0 {
            errors.push("polling_interval must be positive".to_string());
        }

        if self.max_concurrent_strategies == 0 {
            errors.push("max_concurrent_strategies must be positive".to_string());
        }

        if self.risk_tolerance <= 0.0 || self.risk_tolerance >= 1.0 {
            errors.push("risk_tolerance must be between 0 and 1".to_string());
        }

        if self.markets.is_empty() {
            errors.push("markets must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Polling interval as a Duration
    pub fn polling_duration(&self) -> Duration {
        Duration::from_secs(self.polling_interval)
    }
}
