use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::{PipelineError, PipelineResult};
use crate::sequence::Rejection;

/// Default audit log name, resolved against the working directory
pub const DEFAULT_AUDIT_LOG: &str = "stand_error.log";

/// Append-only run log for records excluded from processing.
///
/// Writes go through a mutex so the log can be shared by parallel stages.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl AuditLog {
    /// Truncate (or create) the log at the start of a run
    pub fn create<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref().to_path_buf();
        File::create(&path)?;
        let file = OpenOptions::new().append(true).open(&path)?;
        Ok(Self { path, file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a block of rejected records; nothing is written for an empty report
    pub fn record_rejections(&self, rejections: &[Rejection]) -> PipelineResult<()> {
        if rejections.is_empty() {
            return Ok(());
        }
        let mut file = self.file.lock().map_err(|e| PipelineError::LockError(e.to_string()))?;
        writeln!(file, "\n===== REMOVED SEQUENCES =====")?;
        for rejection in rejections {
            writeln!(file, "{}", rejection)?;
        }
        file.flush()?;
        Ok(())
    }
}
