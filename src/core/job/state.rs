//! Durable job state
//!
//! One JSON document per job under the jobs directory. Updates are shallow
//! merges: read the current document, overlay the patch keys, write the
//! result back pretty-printed. Stage updates therefore only carry the keys
//! they change.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::domain::{ExportError, JobId, JobRecord, Result};

pub struct JobStateStore {
    dir: PathBuf,
}

impl JobStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JobStateStore { dir: dir.into() }
    }

    fn job_file(&self, job_id: &str) -> PathBuf {
        self.dir.join(format!("{job_id}.json"))
    }

    /// Overlay `patch` onto the stored document and persist the merge.
    pub fn apply(&self, job_id: &JobId, patch: Value) -> Result<()> {
        let Value::Object(patch) = patch else {
            return Err(ExportError::State(
                "job state patch must be a JSON object".into(),
            ));
        };
        fs::create_dir_all(&self.dir)?;
        let path = self.job_file(job_id.as_str());
        let mut state = self.read_object(&path)?;
        for (key, value) in patch {
            state.insert(key, value);
        }
        let rendered = serde_json::to_string_pretty(&Value::Object(state))?;
        fs::write(&path, rendered)?;
        Ok(())
    }

    fn read_object(&self, path: &Path) -> Result<Map<String, Value>> {
        if !path.is_file() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(path)?;
        match serde_json::from_str(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            // A mangled document is treated as absent rather than wedging
            // the job forever.
            _ => Ok(Map::new()),
        }
    }

    pub fn load(&self, job_id: &str) -> Result<JobRecord> {
        let path = self.job_file(job_id);
        if !path.is_file() {
            return Err(ExportError::State(format!("unknown job '{job_id}'")));
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Most recent jobs first, capped at `limit`. Unreadable documents are
    /// skipped.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<JobRecord>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut records: Vec<JobRecord> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Ok(raw) = fs::read_to_string(&path) {
                if let Ok(record) = serde_json::from_str::<JobRecord>(&raw) {
                    records.push(record);
                }
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit);
        Ok(records)
    }
}
