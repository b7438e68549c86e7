//! Progress signalling toward the primary store
//!
//! The legacy desktop tooling polls two rows of the `varios` table to show
//! batch totals while an export runs. The sink is a capability the
//! orchestrator receives; tests and headless runs plug in the no-op.

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::sql::{SqlGateway, SqlValue};
use crate::domain::Result;

const UPDATE_SQL: &str = "update varios set contenido = ? where variab = ?";

#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Total number of invoices the run will process.
    async fn planned_total(&self, total: usize) -> Result<()>;
    /// Number of invoices processed so far.
    async fn processed(&self, count: usize) -> Result<()>;
}

/// Writes the two counters the polling UI reads.
pub struct StatusTableSink {
    primary: Arc<dyn SqlGateway>,
}

impl StatusTableSink {
    pub fn new(primary: Arc<dyn SqlGateway>) -> Self {
        StatusTableSink { primary }
    }

    async fn set(&self, variable: &str, value: usize) -> Result<()> {
        let params = [
            SqlValue::Int(value as i64),
            SqlValue::from(variable),
        ];
        self.primary.execute(UPDATE_SQL, &params).await?;
        Ok(())
    }
}

#[async_trait]
impl ProgressSink for StatusTableSink {
    async fn planned_total(&self, total: usize) -> Result<()> {
        self.set("CANTIDADFURIPS", total).await
    }

    async fn processed(&self, count: usize) -> Result<()> {
        self.set("CANTIDADSUBIDA", count).await
    }
}

pub struct NoopProgressSink;

#[async_trait]
impl ProgressSink for NoopProgressSink {
    async fn planned_total(&self, _total: usize) -> Result<()> {
        Ok(())
    }

    async fn processed(&self, _count: usize) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sql::{Engine, SqlRow};
    use std::sync::Mutex;

    struct RecordingGateway {
        statements: Mutex<Vec<(String, Vec<SqlValue>)>>,
    }

    #[async_trait]
    impl SqlGateway for RecordingGateway {
        fn engine(&self) -> Engine {
            Engine::Firebird
        }

        async fn query(&self, _sql: &str, _params: &[SqlValue]) -> Result<Vec<SqlRow>> {
            Ok(vec![])
        }

        async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
            self.statements
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
            Ok(1)
        }
    }

    #[tokio::test]
    async fn test_counters_update_the_status_table() {
        let gateway = Arc::new(RecordingGateway {
            statements: Mutex::new(vec![]),
        });
        let sink = StatusTableSink::new(gateway.clone());
        sink.planned_total(7).await.unwrap();
        sink.processed(3).await.unwrap();

        let statements = gateway.statements.lock().unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].0.contains("update varios"));
        assert_eq!(
            statements[0].1,
            vec![SqlValue::Int(7), SqlValue::from("CANTIDADFURIPS")]
        );
        assert_eq!(
            statements[1].1,
            vec![SqlValue::Int(3), SqlValue::from("CANTIDADSUBIDA")]
        );
    }
}
