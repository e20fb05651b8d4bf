//! Per-job work done by each pool worker: directory expansion and file
//! classification.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::extract;
use super::rules::RuleSet;
use super::types::{Job, MatchReason, Report, ScanCounters};

/// Where a worker sends what it finds
pub trait JobSink {
    /// A new job for the dispatcher
    fn discovered(&self, job: Job) -> Result<()>;

    /// A classification result for the aggregator
    fn matched(&self, report: Report) -> Result<()>;
}

/// Processes one job at a time against a shared, read-only rule set
pub struct JobProcessor<'a> {
    rules: &'a RuleSet,
    max_file_size: u64,
    counters: &'a ScanCounters,
}

impl<'a> JobProcessor<'a> {
    pub fn new(rules: &'a RuleSet, max_file_size: u64, counters: &'a ScanCounters) -> Self {
        Self {
            rules,
            max_file_size,
            counters,
        }
    }

    /// Process a single job. Errors are per-job and never fatal to the pool.
    pub fn process(&self, job: &Job, sink: &impl JobSink) -> Result<()> {
        match job {
            Job::Directory(path) => self.expand_directory(path, sink),
            Job::Entry(path) => {
                self.counters.increment_files();
                self.classify_entry(path, sink)
            }
            Job::File(path) => self.classify_content(path, sink),
        }
    }

    /// Enumerate direct entries, queueing sub-directories and files that
    /// need their content scanned
    fn expand_directory(&self, dir: &Path, sink: &impl JobSink) -> Result<()> {
        let entries = fs::read_dir(dir).with_context(|| format!("Error reading {}", dir.display()))?;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Error reading entry in {}: {}", dir.display(), e);
                    continue;
                }
            };

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    tracing::warn!("Unable to stat {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            if file_type.is_dir() {
                self.counters.increment_directories();
                sink.discovered(Job::Directory(entry.path()))?;
            } else if file_type.is_file() {
                self.counters.increment_files();
                self.classify_entry(&entry.path(), sink)?;
            } else {
                tracing::debug!("Unknown file type: {}", entry.path().display());
            }
        }

        Ok(())
    }

    /// Filename rules for one regular file, deferring content checks to a
    /// later file job
    fn classify_entry(&self, path: &Path, sink: &impl JobSink) -> Result<()> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        if name.is_empty() {
            return Ok(());
        }

        if self.rules.is_filename_ignored(&name) {
            tracing::trace!("Ignored by filename: {}", name);
            return Ok(());
        }

        if let Some(rule) = self.rules.classify_filename(&name) {
            return sink.matched(Report::for_path(
                path,
                MatchReason::Filename,
                &rule.category,
                rule.pattern(),
            ));
        }

        let size = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::warn!("Unable to stat {}: {}", path.display(), e);
                return Ok(());
            }
        };

        if size > self.max_file_size {
            tracing::trace!("Too large for content scan ({} bytes): {}", size, path.display());
            return Ok(());
        }

        if self.rules.is_content_ignored(&name) {
            tracing::trace!("Content ignored: {}", name);
            return Ok(());
        }

        sink.discovered(Job::File(path.to_path_buf()))
    }

    /// Run every content rule over the file's extracted bytes
    fn classify_content(&self, path: &Path, sink: &impl JobSink) -> Result<()> {
        let content = extract::extract(path, self.max_file_size)?;

        for rule in self.rules.classify_content(&content) {
            sink.matched(Report::for_path(
                path,
                MatchReason::Content,
                &rule.category,
                rule.pattern(),
            ))?;
        }

        Ok(())
    }
}
