//! Crawl, dispatch and classify pipeline
//!
//! One dispatcher, a fixed pool of workers and one report aggregator, all
//! connected by crossbeam channels inside a single thread scope:
//!
//! ```text
//!  root ─▶ dispatcher ──Job──▶ workers ──Report──▶ aggregator ─▶ ReportBook
//!             ▲                  │
//!             └──── Discovery ───┘
//! ```

use anyhow::{Context, Result, anyhow, bail};
use crossbeam::channel::{Receiver, Sender, bounded};
use std::fs;
use std::path::Path;
use std::time::Instant;

use super::report::ReportBook;
use super::rules::RuleSet;
use super::types::{Job, Report, ScanCounters, ScanStats};
use super::worker::{JobProcessor, JobSink};
use crate::config::ScanConfig;
use crate::parallel::{Discovery, Dispatcher};

/// Everything a finished scan produced
#[derive(Debug)]
pub struct ScanOutcome {
    pub reports: ReportBook,
    pub stats: ScanStats,
    /// Jobs handed to workers, the root included
    pub jobs_dispatched: usize,
}

/// Worker-side ends of the pipeline channels
struct ChannelSink {
    intake_tx: Sender<Discovery<Job>>,
    report_tx: Sender<Report>,
}

impl ChannelSink {
    fn finished(&self) -> Result<()> {
        self.intake_tx
            .send(Discovery::Finished)
            .map_err(|_| anyhow!("Dispatcher stopped accepting jobs"))
    }
}

impl JobSink for ChannelSink {
    fn discovered(&self, job: Job) -> Result<()> {
        let path = job.path().display().to_string();
        self.intake_tx
            .send(Discovery::Found(job))
            .map_err(|_| anyhow!("Dispatcher stopped accepting jobs, dropped {}", path))
    }

    fn matched(&self, report: Report) -> Result<()> {
        self.report_tx
            .send(report)
            .map_err(|_| anyhow!("Report aggregator is gone"))
    }
}

/// Context for worker threads to avoid too many function parameters
struct WorkerContext<'a> {
    worker_id: usize,
    work_rx: Receiver<Job>,
    sink: ChannelSink,
    counters: &'a ScanCounters,
}

/// A configured scan, reusable across roots
pub struct Pipeline {
    rules: RuleSet,
    config: ScanConfig,
}

impl Pipeline {
    pub fn new(rules: RuleSet, config: ScanConfig) -> Self {
        Self { rules, config }
    }

    /// Scan the tree under `root` and return the grouped reports once the
    /// dispatcher has judged the tree drained.
    pub fn run(&self, root: &Path) -> Result<ScanOutcome> {
        let root_job = Self::root_job(root)?;
        let workers = std::cmp::max(1, self.config.max_workers);
        let start_time = Instant::now();
        let counters = ScanCounters::new();

        let (intake_tx, intake_rx) = bounded::<Discovery<Job>>(workers * 2);
        let (work_tx, work_rx) = bounded::<Job>(0);
        let (report_tx, report_rx) = bounded::<Report>(workers * 4);

        let mut dispatcher = Dispatcher::new(intake_rx, work_tx, self.config.drain);
        dispatcher.seed(root_job);

        tracing::info!(
            "Scanning {} with {} workers, drain policy {}",
            root.display(),
            workers,
            self.config.drain
        );

        let (reports, jobs_dispatched) = crossbeam::thread::scope(|s| -> Result<(ReportBook, usize)> {
            let aggregator = s.spawn(move |_| ReportBook::collect(report_rx));

            let counters = &counters;
            for worker_id in 0..workers {
                let ctx = WorkerContext {
                    worker_id,
                    work_rx: work_rx.clone(),
                    sink: ChannelSink {
                        intake_tx: intake_tx.clone(),
                        report_tx: report_tx.clone(),
                    },
                    counters,
                };

                s.spawn(move |_| self.worker_thread(ctx));
            }

            // Workers hold the only remaining senders
            drop(work_rx);
            drop(intake_tx);
            drop(report_tx);

            let dispatched = dispatcher.run();

            let reports = aggregator
                .join()
                .map_err(|_| anyhow!("Report aggregator panicked"))?;
            Ok((reports, dispatched))
        })
        .map_err(|_| anyhow!("Thread panic occurred during scan"))??;

        let stats = counters.to_stats(start_time.elapsed());
        tracing::info!(
            "Scan finished: {} directories, {} files, {} reports in {:?}",
            stats.directories,
            stats.files,
            reports.len(),
            stats.elapsed
        );

        Ok(ScanOutcome {
            reports,
            stats,
            jobs_dispatched,
        })
    }

    /// Pick the starting job from what the root is on disk
    fn root_job(root: &Path) -> Result<Job> {
        let metadata = fs::metadata(root)
            .with_context(|| format!("Unable to stat {}", root.display()))?;

        if metadata.is_dir() {
            Ok(Job::Directory(root.to_path_buf()))
        } else if metadata.is_file() {
            Ok(Job::Entry(root.to_path_buf()))
        } else {
            bail!("Not a directory or regular file: {}", root.display())
        }
    }

    fn worker_thread(&self, ctx: WorkerContext<'_>) {
        let processor = JobProcessor::new(&self.rules, self.config.max_file_size, ctx.counters);
        let mut processed = 0usize;

        while let Ok(job) = ctx.work_rx.recv() {
            if let Err(e) = processor.process(&job, &ctx.sink) {
                tracing::warn!("{:#}", e);
            }
            processed += 1;

            if ctx.sink.finished().is_err() {
                tracing::debug!("Worker {} saw the dispatcher close early", ctx.worker_id);
            }
        }

        tracing::debug!("Worker {} exiting after {} jobs", ctx.worker_id, processed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::DrainPolicy;
    use crate::scanner::types::MatchReason;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const RULES: &str = "\
;section filename
;category names
secret
;section content
;category tokens
token=\\d+
;section ignore-filename
\\.ignored$
;section ignore-content
\\.nocontent$
";

    fn pipeline(workers: usize) -> Pipeline {
        limited_pipeline(workers, 10 * 1024 * 1024)
    }

    fn limited_pipeline(workers: usize, max_file_size: u64) -> Pipeline {
        Pipeline::new(
            RuleSet::parse(RULES).unwrap(),
            ScanConfig {
                max_workers: workers,
                max_file_size,
                drain: DrainPolicy::Tracked,
            },
        )
    }

    fn build_tree(root: &Path) {
        for dir in ["a", "a/b", "a/b/c", "d", "d/e"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        fs::write(root.join("secret.txt"), "nothing").unwrap();
        fs::write(root.join("a/token.txt"), "token=1").unwrap();
        fs::write(root.join("a/b/c/deep.txt"), "x token=2 y").unwrap();
        fs::write(root.join("d/e/plain.txt"), "plain").unwrap();
        fs::write(root.join("d/token.ignored"), "token=3").unwrap();
    }

    fn report_set(outcome: &ScanOutcome) -> Vec<(MatchReason, String, PathBuf)> {
        let mut set: Vec<_> = outcome
            .reports
            .reports()
            .map(|r| (r.reason, r.category.clone(), PathBuf::from(r.display_path())))
            .collect();
        set.sort();
        set
    }

    #[test]
    fn test_counts_independent_of_worker_count() {
        let temp = TempDir::new().unwrap();
        build_tree(temp.path());

        for workers in [1, 4, 16] {
            let outcome = pipeline(workers).run(temp.path()).unwrap();
            assert_eq!(outcome.stats.directories, 5, "workers={}", workers);
            assert_eq!(outcome.stats.files, 5, "workers={}", workers);
        }
    }

    #[test]
    fn test_reports_independent_of_worker_count() {
        let temp = TempDir::new().unwrap();
        build_tree(temp.path());

        let single = report_set(&pipeline(1).run(temp.path()).unwrap());
        assert_eq!(single.len(), 3);
        for workers in [4, 16] {
            assert_eq!(report_set(&pipeline(workers).run(temp.path()).unwrap()), single);
        }
    }

    #[test]
    fn test_ignored_file_never_reported() {
        let temp = TempDir::new().unwrap();
        build_tree(temp.path());

        let outcome = pipeline(2).run(temp.path()).unwrap();
        assert!(outcome.reports.reports().all(|r| r.file_name != "token.ignored"));
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(pipeline(2).run(&temp.path().join("missing")).is_err());
    }

    #[test]
    fn test_file_root_is_counted_and_content_scanned() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("single.txt");
        fs::write(&file, "token=42").unwrap();

        let outcome = pipeline(2).run(&file).unwrap();
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports.reports().next().unwrap().reason, MatchReason::Content);
        assert_eq!(outcome.stats.files, 1);
        assert_eq!(outcome.stats.directories, 0);
        // The name check, then the content job
        assert_eq!(outcome.jobs_dispatched, 2);
    }

    #[test]
    fn test_file_root_obeys_filename_and_size_rules() {
        let temp = TempDir::new().unwrap();
        let scan = |name: &str, max_file_size: u64| {
            let file = temp.path().join(name);
            fs::write(&file, "token=123456789").unwrap();
            limited_pipeline(2, max_file_size).run(&file).unwrap()
        };

        let ignored = scan("x.ignored", 1024);
        assert!(ignored.reports.is_empty());
        assert_eq!(ignored.stats.files, 1);

        let content_ignored = scan("x.nocontent", 1024);
        assert!(content_ignored.reports.is_empty());
        assert_eq!(content_ignored.stats.files, 1);

        let oversized = scan("big.txt", 4);
        assert!(oversized.reports.is_empty());
        assert_eq!(oversized.stats.files, 1);

        let named = scan("secret.txt", 4);
        let reasons: Vec<_> = named.reports.reports().map(|r| r.reason).collect();
        assert_eq!(reasons, vec![MatchReason::Filename]);
        assert_eq!(named.stats.files, 1);
    }

    #[test]
    fn test_unreadable_subtree_does_not_abort() {
        let temp = TempDir::new().unwrap();
        build_tree(temp.path());
        // A dangling symlink is neither file nor directory and is skipped
        #[cfg(unix)]
        std::os::unix::fs::symlink(temp.path().join("nowhere"), temp.path().join("dangling")).unwrap();

        let outcome = pipeline(4).run(temp.path()).unwrap();
        assert_eq!(outcome.stats.files, 5);
    }
}
