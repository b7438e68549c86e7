//! Store factory
//!
//! Builds the concrete gateways from configuration. The Firebird driver is
//! behind the `firebird` cargo feature; a build without it still compiles the
//! whole pipeline and reports a configuration error when a legacy store is
//! actually needed.

use crate::adapters::mysql::MySqlGateway;
use crate::adapters::sql::SqlGateway;
use crate::config::{FirebirdConfig, FuripsConfig};
use crate::domain::Result;
use std::sync::Arc;

/// The three store gateways one job works against
pub struct StoreSet {
    /// Live legacy transactional store
    pub primary: Arc<dyn SqlGateway>,
    /// Frozen previous instance of the legacy schema, when configured
    pub snapshot: Option<Arc<dyn SqlGateway>>,
    /// Replicated analytical store
    pub analytical: Arc<dyn SqlGateway>,
}

/// Build all configured gateways.
pub fn build_stores(config: &FuripsConfig) -> Result<StoreSet> {
    let primary = firebird_gateway(&config.firebird)?;
    let snapshot = match &config.firebird_previous {
        Some(previous) => Some(firebird_gateway(previous)?),
        None => None,
    };
    let analytical: Arc<dyn SqlGateway> = Arc::new(MySqlGateway::new(&config.mysql));
    Ok(StoreSet {
        primary,
        snapshot,
        analytical,
    })
}

#[cfg(feature = "firebird")]
fn firebird_gateway(config: &FirebirdConfig) -> Result<Arc<dyn SqlGateway>> {
    Ok(Arc::new(crate::adapters::firebird::FirebirdGateway::new(
        config.clone(),
    )))
}

#[cfg(not(feature = "firebird"))]
fn firebird_gateway(_config: &FirebirdConfig) -> Result<Arc<dyn SqlGateway>> {
    Err(crate::domain::ExportError::Configuration(
        "this build has no Firebird driver; rebuild with `--features firebird`".to_string(),
    ))
}
