//! Export publishing
//!
//! Generated files are copied from the working directory into a per-job
//! folder under the exports directory; the copies are what the download
//! boundary serves. A run that generated nothing still publishes a
//! placeholder entry so the record is never silently empty.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{JobId, Output, Result};

pub struct ExportPublisher {
    exports_dir: PathBuf,
}

impl ExportPublisher {
    pub fn new(exports_dir: impl Into<PathBuf>) -> Self {
        ExportPublisher {
            exports_dir: exports_dir.into(),
        }
    }

    pub fn publish(&self, job_id: &JobId, suffix: &str, files: &[PathBuf]) -> Result<Vec<Output>> {
        let target_dir = self.exports_dir.join(job_id.as_str());
        fs::create_dir_all(&target_dir)?;

        let mut outputs = Vec::new();
        let mut sorted: Vec<&PathBuf> = files.iter().filter(|f| f.is_file()).collect();
        sorted.sort();
        for file in sorted {
            let name = file_name(file);
            let target = target_dir.join(&name);
            fs::copy(file, &target)?;
            outputs.push(Output {
                name,
                source: Some(file.clone()),
                exported: Some(target),
            });
        }

        if outputs.is_empty() {
            outputs.push(Output {
                name: format!("no-furips-{suffix}.txt"),
                source: None,
                exported: None,
            });
        }
        Ok(outputs)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copies_into_per_job_folder() {
        let work = TempDir::new().unwrap();
        let exports = TempDir::new().unwrap();
        let f1 = work.path().join("FURIPS154001022720129082026.txt");
        let f2 = work.path().join("FURIPS254001022720129082026.txt");
        fs::write(&f1, "a\r\n").unwrap();
        fs::write(&f2, "b\r\n").unwrap();

        let job_id = JobId::generate();
        let publisher = ExportPublisher::new(exports.path());
        let outputs = publisher
            .publish(&job_id, "54001022720129082026", &[f1.clone(), f2.clone()])
            .unwrap();

        assert_eq!(outputs.len(), 2);
        for output in &outputs {
            let exported = output.exported.as_ref().unwrap();
            assert!(exported.starts_with(exports.path().join(job_id.as_str())));
            assert!(exported.is_file());
        }
        assert!(f1.is_file());
    }

    #[test]
    fn test_placeholder_when_nothing_generated() {
        let exports = TempDir::new().unwrap();
        let publisher = ExportPublisher::new(exports.path());
        let outputs = publisher.publish(&JobId::generate(), "X", &[]).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].name, "no-furips-X.txt");
        assert!(outputs[0].source.is_none());
        assert!(outputs[0].exported.is_none());
    }
}
