//! SQL gateway abstraction shared by all store adapters

pub mod audit;
pub mod traits;

pub use audit::{AuditedGateway, SqlAuditLog};
pub use traits::{Engine, Operation, SqlGateway, SqlRow, SqlValue};
