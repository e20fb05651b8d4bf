//! # filesift
//!
//! Recursively scans a directory tree and classifies every regular file by
//! filename and content against a rule file of regular expressions, then
//! prints a report grouped by category.
//!
//! Directory expansion and file classification share one fixed worker pool.
//! A dispatcher feeds the pool from an unbounded queue and tracks every job
//! from discovery to completion, so the scan ends exactly when the tree is
//! exhausted.
//!
//! ## Quick Start
//!
//! ```bash
//! filesift --rules regexps.cfg --workers 16 /srv/share
//! ```
//!
//! ```no_run
//! use filesift::config::ScanSettings;
//! use filesift::scanner::{Pipeline, RuleSet};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let rules = RuleSet::load(Path::new("regexps.cfg"))?;
//! let config = ScanSettings::default().resolve()?;
//! let outcome = Pipeline::new(rules, config).run(Path::new("/srv/share"))?;
//! for report in outcome.reports.reports() {
//!     println!("{}", report);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod parallel;
pub mod scanner;

pub use cli::{Cli, Output};
pub use config::{ScanConfig, ScanSettings};
