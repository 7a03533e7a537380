use clap::Parser;
use std::path::PathBuf;

use crate::persistence::DEFAULT_CREDENTIALS_FILE;

/// Master agent for the autonomous trading ecosystem
#[derive(Debug, Parser)]
#[command(name = "maestro", version, about)]
pub struct Cli {
    /// Path to the configuration file (TOML or JSON)
    #[arg(short, long, env = "MAESTRO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the state store credential artifact
    #[arg(long, default_value = DEFAULT_CREDENTIALS_FILE)]
    pub credentials: PathBuf,

    /// Override the configured logging level
    #[arg(long)]
    pub log_level: Option<String>,
}
