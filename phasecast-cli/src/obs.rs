//! Logging initialisation for the `phasecast` binary.

use anyhow::{anyhow, Result};
use clap::ValueEnum;

/// Environment variable holding an `EnvFilter` directive, e.g. `phasecast_core=debug`.
pub const LOG_ENV: &str = "PHASECAST_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

pub fn init_tracing(default_level: &str, format: LogFormat) -> Result<()> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| anyhow!("invalid log filter: {err}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}
