//! Store adapters
//!
//! Concrete gateways to the legacy Firebird instances and the analytical
//! MySQL replica, behind the [`sql::SqlGateway`] trait.

pub mod factory;
#[cfg(feature = "firebird")]
pub mod firebird;
pub mod mysql;
pub mod sql;

pub use factory::{build_stores, StoreSet};
