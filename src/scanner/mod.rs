//! Filesystem classification: rules, content extraction, the worker pool
//! and report aggregation.

pub mod extract;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod types;
pub mod worker;

// Re-export main types for easier access
pub use pipeline::{Pipeline, ScanOutcome};
pub use report::ReportBook;
pub use rules::{Rule, RuleSection, RuleSet};
pub use types::{Job, MatchReason, Report, ScanCounters, ScanStats};
pub use worker::{JobProcessor, JobSink};
