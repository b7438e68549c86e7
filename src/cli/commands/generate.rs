//! Generate command implementation
//!
//! Runs one export job end to end and prints the published outputs.

use clap::Args;

use crate::adapters::build_stores;
use crate::config::load_config;
use crate::core::job::{JobOrchestrator, JobRequest};

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Start of the reporting window (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub start: String,

    /// End of the reporting window (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub end: String,

    /// Entity code of the insurer to export
    #[arg(long)]
    pub entity: String,
}

impl GenerateArgs {
    /// Execute the generate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(start = %self.start, end = %self.end, entity = %self.entity, "Starting FURIPS export");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let stores = match build_stores(&config) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to build store gateways");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let orchestrator = JobOrchestrator::new(config.storage.clone(), stores);
        let request = JobRequest {
            start: self.start.clone(),
            end: self.end.clone(),
            entity_code: self.entity.clone(),
        };

        match orchestrator.run(&request).await {
            Ok(outcome) => {
                println!("✅ FURIPS files generated");
                println!();
                println!("Job:      {}", outcome.job_id);
                println!("Plan:     {}", outcome.plan.content);
                println!("Log:      {}", outcome.log.display());
                println!("SQL log:  {}", outcome.sql_log.display());
                println!();
                println!("Outputs:");
                for output in &outcome.outputs {
                    match &output.exported {
                        Some(path) => println!("  {} -> {}", output.name, path.display()),
                        None => println!("  {} (nothing generated)", output.name),
                    }
                }
                Ok(0)
            }
            Err(e) if e.is_user_error() => {
                println!("❌ {e}");
                Ok(1) // Invalid request exit code
            }
            Err(e) => {
                println!("❌ Export failed");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }
}
