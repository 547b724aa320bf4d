//! PID file for the running daemon.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Holds the PID file for as long as the daemon runs; removed on drop.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Write the current process id to `path`, replacing a stale file.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, std::process::id().to_string())?;
        tracing::debug!(path = %path.display(), pid = std::process::id(), "PID file written");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "PID file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove PID file"),
        }
    }
}

/// Read the process id recorded in `path`.
///
/// `Ok(None)` when the file is missing or does not hold a number.
pub fn read_pid(path: &Path) -> io::Result<Option<u32>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents.trim().parse().ok()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pid_file_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("run").join("daemon.pid");

        let pid_file = PidFile::create(&path).unwrap();
        assert_eq!(read_pid(&path).unwrap(), Some(std::process::id()));

        drop(pid_file);
        assert!(!path.exists());
        assert_eq!(read_pid(&path).unwrap(), None);
    }

    #[test]
    fn test_read_pid_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("daemon.pid");
        fs::write(&path, "not-a-pid").unwrap();

        assert_eq!(read_pid(&path).unwrap(), None);
    }
}
