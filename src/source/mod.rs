//! Connectivity report sources.
//!
//! This module provides a trait-based abstraction for obtaining the raw
//! connectivity report (the text `wg show` prints), plus the parser that
//! turns that text into per-peer readings.

mod command;
mod file;
pub mod report;

pub use command::CommandSource;
pub use file::FileSource;
pub use report::parse_report;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::MonitorError;

/// Trait for sampling the current connectivity report.
///
/// Implementations return the report text unparsed; parsing is done by
/// [`parse_report`] so it can be tested without any source at all.
///
/// # Example
///
/// ```no_run
/// use peerwatch::{FileSource, ReportSource};
///
/// # tokio_test::block_on(async {
/// let mut source = FileSource::new("wg-show.txt");
/// let report = source.sample().await?;
/// println!("{} peers", peerwatch::parse_report(&report).len());
/// # Ok::<_, peerwatch::MonitorError>(())
/// # });
/// ```
#[async_trait]
pub trait ReportSource: Send + Sync + Debug {
    /// Sample the latest report.
    async fn sample(&mut self) -> Result<String, MonitorError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used in log lines.
    fn description(&self) -> &str;
}
