//! Structured logging setup using tracing
//!
//! Console-only structured output; the per-job process and SQL transcripts
//! are separate artifacts written by the job itself.

use crate::domain::{ExportError, Result};
use tracing_subscriber::EnvFilter;

/// Initialize the logging system. `FURIPS_LOG`/`RUST_LOG` style directives in
/// the environment take precedence over the configured level.
pub fn init_logging(log_level: &str) -> Result<()> {
    let level = parse_log_level(log_level)?;
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("furips={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .map_err(|e| ExportError::Configuration(format!("could not initialize logging: {e}")))?;
    Ok(())
}

fn parse_log_level(value: &str) -> Result<&str> {
    match value.to_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(ExportError::Configuration(format!(
            "invalid log level '{other}' (expected trace, debug, info, warn or error)"
        ))),
    }
}
