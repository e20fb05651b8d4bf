use serde::Serialize;
use std::fmt;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A unit of traversal work, tagged by the producer that discovered it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Expand the directory's direct entries
    Directory(PathBuf),
    /// Count and classify a regular file by name, then queue its content
    Entry(PathBuf),
    /// Extract and classify the file's content
    File(PathBuf),
}

impl Job {
    pub fn path(&self) -> &Path {
        match self {
            Job::Directory(path) | Job::Entry(path) | Job::File(path) => path,
        }
    }
}

/// Why a file ended up in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchReason {
    Filename,
    Content,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::Filename => "filename",
            MatchReason::Content => "content",
        }
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classification result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub file_name: String,
    /// Parent directory, always terminated by the platform separator
    pub directory: String,
    pub reason: MatchReason,
    pub category: String,
    /// Source text of the rule that matched
    pub pattern: String,
}

impl Report {
    /// Build a report for `path`, splitting it into directory and file name.
    pub fn for_path(path: &Path, reason: MatchReason, category: &str, pattern: &str) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let directory = path
            .parent()
            .map(directory_string)
            .unwrap_or_default();

        Self {
            file_name,
            directory,
            reason,
            category: category.to_string(),
            pattern: pattern.to_string(),
        }
    }

    /// Full path as printed in the report: directory followed by file name
    pub fn display_path(&self) -> String {
        format!("{}{}", self.directory, self.file_name)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}{}",
            self.reason, self.category, self.pattern, self.directory, self.file_name
        )
    }
}

/// Render a directory path with a trailing separator
pub fn directory_string(dir: &Path) -> String {
    let mut rendered = dir.to_string_lossy().into_owned();
    if rendered.is_empty() {
        return rendered;
    }
    if !rendered.ends_with(MAIN_SEPARATOR) {
        rendered.push(MAIN_SEPARATOR);
    }
    rendered
}

/// Entry counters owned by a single pipeline run
#[derive(Debug, Default)]
pub struct ScanCounters {
    directories: AtomicUsize,
    files: AtomicUsize,
}

impl ScanCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_directories(&self) {
        self.directories.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_files(&self) {
        self.files.fetch_add(1, Ordering::Relaxed);
    }

    /// Freeze the counters into final statistics
    pub fn to_stats(&self, elapsed: Duration) -> ScanStats {
        ScanStats {
            directories: self.directories.load(Ordering::Relaxed),
            files: self.files.load(Ordering::Relaxed),
            elapsed,
        }
    }
}

/// Final statistics from a completed scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub directories: usize,
    pub files: usize,
    pub elapsed: Duration,
}
