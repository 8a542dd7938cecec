//! File-based report source.
//!
//! Reads a saved `wg show` report, e.g. one captured by a cron job running
//! with different privileges.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::ReportSource;
use crate::error::MonitorError;

/// A report source that reads the connectivity report from a text file.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReportSource for FileSource {
    async fn sample(&mut self) -> Result<String, MonitorError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| MonitorError::Sample(format!("read error on {}: {}", self.path.display(), e)))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/wg.txt");
        assert_eq!(source.path(), Path::new("/tmp/wg.txt"));
        assert_eq!(source.description(), "file: /tmp/wg.txt");
    }

    #[tokio::test]
    async fn test_file_source_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "peer: abc=\n  latest handshake: 3 seconds ago").unwrap();

        let mut source = FileSource::new(file.path());
        let report = source.sample().await.unwrap();
        assert!(report.starts_with("peer: abc="));

        // Every sample re-reads the file
        let again = source.sample().await.unwrap();
        assert_eq!(report, again);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/wg.txt");

        let err = source.sample().await.unwrap_err();
        assert!(matches!(err, MonitorError::Sample(_)));
        assert!(err.to_string().contains("read error"));
    }
}
