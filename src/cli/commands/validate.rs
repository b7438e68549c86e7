//! Validate config command implementation

use clap::Args;

use crate::config::load_config;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Primary store: {}:{} ({})",
            config.firebird.host, config.firebird.port, config.firebird.path
        );
        match &config.firebird_previous {
            Some(previous) => println!(
                "  Snapshot store: {}:{} ({})",
                previous.host, previous.port, previous.path
            ),
            None => println!("  Snapshot store: not configured"),
        }
        println!(
            "  Analytical store: {}:{}/{}",
            config.mysql.host, config.mysql.port, config.mysql.database
        );
        println!("  Work dir: {}", config.storage.work_dir.display());
        println!("  Plan file: {}", config.storage.plan_file().display());
        println!("  Exports dir: {}", config.storage.exports_dir.display());
        Ok(0)
    }
}
