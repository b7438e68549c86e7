//! Append-only SQL audit transcript
//!
//! One plain-text transcript per job id. Every statement issued to any store
//! during the job is appended with its engine and operation tags. The file is
//! diagnostic only; nothing in the pipeline reads it back.
//!
//! The transcript is the one shared mutable resource of a run, so each append
//! (header included) takes an exclusive advisory lock for just the duration
//! of the write.

use crate::adapters::sql::traits::{Engine, Operation, SqlGateway, SqlRow, SqlValue};
use crate::domain::{ExportError, JobId, Result};
use async_trait::async_trait;
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-job SQL transcript writer
pub struct SqlAuditLog {
    path: PathBuf,
}

impl SqlAuditLog {
    /// Create the transcript file for a job, creating the directory on
    /// demand.
    pub fn create(dir: &Path, job_id: &JobId) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            ExportError::Io(format!(
                "could not create SQL log directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(SqlAuditLog {
            path: dir.join(format!("{job_id}.sql")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the one-time header identifying the job. Called exactly once,
    /// before any statement is logged.
    pub fn write_header(
        &self,
        job_id: &JobId,
        entity_code: &str,
        entity_name: &str,
        start: &str,
        end: &str,
    ) -> Result<()> {
        let header = format!(
            "-- FURIPS SQL transcript\n-- job: {job_id}\n-- entity: {entity_code} ({entity_name})\n-- range: {start}..{end}\n\n"
        );
        self.locked_append(&header)
    }

    /// Append one statement entry.
    pub fn log(
        &self,
        engine: Engine,
        operation: Operation,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut entry = format!(
            "[{timestamp}][{}][{}]\n{}\n",
            engine.tag(),
            operation.tag(),
            sql.trim()
        );
        if !params.is_empty() {
            let rendered: Vec<String> = params.iter().map(SqlValue::render).collect();
            entry.push_str(&format!("-- params: [{}]\n", rendered.join(", ")));
        }
        entry.push('\n');
        self.locked_append(&entry)
    }

    fn locked_append(&self, entry: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                ExportError::Io(format!(
                    "could not open SQL log {}: {e}",
                    self.path.display()
                ))
            })?;
        file.lock_exclusive()
            .map_err(|e| ExportError::Io(format!("could not lock SQL log: {e}")))?;
        let result = file.write_all(entry.as_bytes());
        let _ = file.unlock();
        result.map_err(|e| ExportError::Io(format!("could not append to SQL log: {e}")))
    }
}

/// Gateway decorator that records every statement in the job transcript
/// before delegating to the wrapped store.
///
/// A transcript write failure fails the statement itself.
pub struct AuditedGateway {
    inner: Arc<dyn SqlGateway>,
    log: Arc<SqlAuditLog>,
}

impl AuditedGateway {
    pub fn new(inner: Arc<dyn SqlGateway>, log: Arc<SqlAuditLog>) -> Self {
        AuditedGateway { inner, log }
    }
}

#[async_trait]
impl SqlGateway for AuditedGateway {
    fn engine(&self) -> Engine {
        self.inner.engine()
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        self.log
            .log(self.inner.engine(), Operation::Query, sql, params)?;
        self.inner.query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.log
            .log(self.inner.engine(), Operation::Execute, sql, params)?;
        self.inner.execute(sql, params).await
    }
}
