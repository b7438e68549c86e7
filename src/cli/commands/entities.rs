//! Entities command implementation
//!
//! Lists the insurance entities known to the primary store, the codes the
//! generate command accepts.

use clap::Args;

use crate::adapters::build_stores;
use crate::config::load_config;

const ENTITIES_SQL: &str = "SELECT codigo, nombre FROM entidad ORDER BY nombre";

/// Arguments for the entities command
#[derive(Args, Debug)]
pub struct EntitiesArgs {}

impl EntitiesArgs {
    /// Execute the entities command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Listing entities");

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

        let rows = match stores.primary.query(ENTITIES_SQL, &[]).await {
            Ok(rows) => rows,
            Err(e) => {
                println!("❌ Failed to query the primary store");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        if rows.is_empty() {
            println!("No entities found.");
            return Ok(0);
        }

        println!("Entities:");
        for row in &rows {
            let code = row.get("CODIGO").trim();
            let name = row.get("NOMBRE").trim();
            println!("  {code:<10} {name}");
        }
        Ok(0)
    }
}
