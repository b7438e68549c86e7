//! Init command implementation
//!
//! Generates a starter configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "furips.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your store settings", self.output);
                println!("  2. Set FURIPS_FB_PASSWORD and FURIPS_MYSQL_PASSWORD in the environment (or a .env file)");
                println!("  3. Validate configuration: furips validate-config");
                println!("  4. Run an export: furips generate --start 2024-01-01 --end 2024-01-07 --entity 001");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    fn sample_config() -> &'static str {
        r#"# FURIPS export configuration

[application]
log_level = "info"

# Primary (live) legacy store
[firebird]
host = "127.0.0.1"
port = 3050
path = "C:/datos/CLINICA.GDB"
user = "SYSDBA"
password = "${FURIPS_FB_PASSWORD}"

# Frozen snapshot of the previous instance, used as a clinical fallback.
# Remove the section if no snapshot exists.
[firebird_previous]
host = "127.0.0.1"
port = 3050
path = "C:/datos/CLINICA_2019.GDB"
user = "SYSDBA"
password = "${FURIPS_FB_PASSWORD}"

# Replicated documental database
[mysql]
host = "127.0.0.1"
port = 3306
database = "gestion_documental"
user = "furips"
password = "${FURIPS_MYSQL_PASSWORD}"

[storage]
work_dir = "storage/furips"
jobs_dir = "storage/jobs"
logs_dir = "storage/logs"
sql_dir = "storage/sql"
exports_dir = "storage/exports"
# plan_file defaults to <work_dir>/globalsafe.txt
"#
    }
}
