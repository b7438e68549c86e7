//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// FURIPS claim export tool
#[derive(Parser, Debug)]
#[command(name = "furips")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "furips.toml", env = "FURIPS_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "FURIPS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an export job for a date range and entity
    Generate(commands::generate::GenerateArgs),

    /// List the insurance entities known to the primary store
    Entities(commands::entities::EntitiesArgs),

    /// Show recent jobs or one job in detail
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_generate() {
        let cli = Cli::parse_from([
            "furips", "generate", "--start", "2024-01-01", "--end", "2024-01-07", "--entity",
            "001",
        ]);
        assert_eq!(cli.config, "furips.toml");
        assert!(matches!(cli.command, Commands::Generate(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["furips", "--config", "custom.toml", "entities"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Entities(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["furips", "--log-level", "debug", "status"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_status_with_job() {
        let cli = Cli::parse_from(["furips", "status", "--job-id", "abc123"]);
        let Commands::Status(args) = cli.command else {
            panic!("expected status");
        };
        assert_eq!(args.job_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["furips", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["furips", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
