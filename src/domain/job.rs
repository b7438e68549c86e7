//! Job lifecycle types
//!
//! A job is created per export run, mutated by merge-updates at each stage
//! and immutable once it reaches a terminal state. The persisted record is
//! what the status/download boundary consults afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Opaque job identifier (32 lower-case hex characters)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh id for a new run.
    pub fn generate() -> Self {
        JobId(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job state machine. Transitions are one-directional:
/// `PlanReady -> Running -> Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    PlanReady,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::PlanReady => "plan-ready",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One generated (or placeholder) output file.
///
/// `exported == None` signals "no file was generated"; downstream must treat
/// that as unavailable, not as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub source: Option<PathBuf>,
    pub exported: Option<PathBuf>,
}

/// The single-line plan descriptor consumed by the downstream process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDescriptor {
    pub path: PathBuf,
    pub content: String,
}

/// Durable snapshot of one job, as persisted by the state store.
///
/// Fields default so that records written by older stages (or partially
/// merged ones) still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub entity_code: String,
    #[serde(default)]
    pub entity_name: String,
    #[serde(default)]
    pub suffix: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub plan: Option<PlanDescriptor>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub sql_log: Option<PathBuf>,
    #[serde(default)]
    pub log: Option<PathBuf>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub finished_at: Option<String>,
}

impl JobRecord {
    /// Resolve a requested output name to its published path, the lookup the
    /// download boundary performs.
    pub fn find_output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|output| output.name == name)
    }
}

/// Outcome returned to the caller that triggered the job.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub plan: PlanDescriptor,
    pub outputs: Vec<Output>,
    pub log: PathBuf,
    pub sql_log: PathBuf,
}
