//! Status command implementation
//!
//! Shows recent export jobs, or one job in detail including its published
//! outputs.

use clap::Args;

use crate::config::load_config;
use crate::core::job::JobStateStore;
use crate::domain::JobRecord;

const RECENT_LIMIT: usize = 20;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Show one job in detail
    #[arg(long)]
    pub job_id: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking job status");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let store = JobStateStore::new(config.storage.jobs_dir.clone());

        if let Some(job_id) = &self.job_id {
            return match store.load(job_id) {
                Ok(record) => {
                    print_detail(&record);
                    Ok(0)
                }
                Err(e) => {
                    println!("❌ {e}");
                    Ok(1)
                }
            };
        }

        let records = match store.list_recent(RECENT_LIMIT) {
            Ok(records) => records,
            Err(e) => {
                println!("❌ Failed to read the jobs directory");
                println!("   Error: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        if records.is_empty() {
            println!("No job history found.");
            println!("Run 'furips generate' to start an export.");
            return Ok(0);
        }

        println!("📊 Recent jobs");
        println!();
        for record in &records {
            println!(
                "  {}  {:<10} {:>3}%  {} {}..{}  {}",
                record.job_id,
                record.status,
                record.progress,
                record.entity_code,
                record.start_date,
                record.end_date,
                record.message
            );
        }
        Ok(0)
    }
}

fn print_detail(record: &JobRecord) {
    println!("Job:       {}", record.job_id);
    println!("Status:    {} ({}%)", record.status, record.progress);
    println!("Entity:    {} ({})", record.entity_code, record.entity_name);
    println!("Range:     {}..{}", record.start_date, record.end_date);
    println!("Message:   {}", record.message);
    println!("Created:   {}", record.created_at);
    if let Some(finished) = &record.finished_at {
        println!("Finished:  {finished}");
    }
    if let Some(plan) = &record.plan {
        println!("Plan:      {} ({})", plan.content, plan.path.display());
    }
    if let Some(log) = &record.log {
        println!("Log:       {}", log.display());
    }
    if let Some(sql_log) = &record.sql_log {
        println!("SQL log:   {}", sql_log.display());
    }
    if !record.outputs.is_empty() {
        println!("Outputs:");
        for output in &record.outputs {
            match &output.exported {
                Some(path) => println!("  {} -> {}", output.name, path.display()),
                None => println!("  {} (nothing generated)", output.name),
            }
        }
    }
}
