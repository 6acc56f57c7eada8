// src/ops_log.rs

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use tracing::warn;

/// Append-only operational log, one `[YYYY-mm-dd HH:MM:SS] message` line per event.
///
/// Writing never fails the caller; problems are reported through `tracing`.
#[derive(Debug, Clone)]
pub struct OpsLog {
    path: PathBuf,
}

impl OpsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, message: &str) {
        let line = format_line(Local::now(), message);
        if let Err(e) = self.append(&line) {
            warn!(path = %self.path.display(), error = %e, "ops log write failed");
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

/// One log line. Embedded newlines are flattened so each event stays on one line.
pub fn format_line(at: DateTime<Local>, message: &str) -> String {
    let flat = message.replace(['\r', '\n'], " ");
    format!("[{}] {}\n", at.format("%Y-%m-%d %H:%M:%S"), flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn format_is_bracketed_timestamp() {
        let at = Local.with_ymd_and_hms(2025, 1, 31, 8, 5, 9).unwrap();
        assert_eq!(
            format_line(at, "Downloaded x.csv"),
            "[2025-01-31 08:05:09] Downloaded x.csv\n"
        );
        assert_eq!(format_line(at, "a\nb"), "[2025-01-31 08:05:09] a b\n");
    }

    #[test]
    fn appends_without_truncating() {
        let dir = tempdir().unwrap();
        let log = OpsLog::new(dir.path().join("logs").join("update_log.txt"));
        log.log("first");
        log.log("second");
        let text = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] first"));
        assert!(lines[1].ends_with("] second"));
    }

    #[test]
    fn unwritable_path_does_not_panic() {
        let dir = tempdir().unwrap();
        // a directory cannot be opened for append
        let log = OpsLog::new(dir.path());
        log.log("ignored");
    }
}
