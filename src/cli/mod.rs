//! Command-line interface for filesift
//!
//! A single command: scan one root path and print the categorized report.
//! Flags left unset fall through to the config file, the environment and
//! finally the built-in defaults.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::{DrainMode, SettingsOverrides};

mod output;
pub mod scan;

pub use output::Output;
pub use scan::OutputFormat;

/// filesift - classify every file under a directory by name and content
#[derive(Parser)]
#[command(name = "filesift", author, version, about, long_about = None)]
pub struct Cli {
    /// Root path to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Number of concurrent workers, 0 for one per CPU core [default: 8]
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Max size of files to scan [default: 10MB]
    #[arg(short, long, value_name = "SIZE")]
    pub max: Option<String>,

    /// Drain timeout in seconds for the timeout drain [default: 5]
    #[arg(long, value_name = "SECONDS")]
    pub wait: Option<u64>,

    /// How the end of the scan is detected [default: tracked]
    #[arg(long, value_enum)]
    pub drain: Option<DrainMode>,

    /// Rule file with filename, content and ignore patterns
    #[arg(short, long, value_name = "FILE", default_value = "regexps.cfg")]
    pub rules: PathBuf,

    /// Configuration file (key=value lines)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress status output and logging
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug logging and a pipeline summary on stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet, self.debug);

        let output = Output::new(self.verbose > 0 || self.debug, self.quiet);
        scan::execute(&self, &output)
    }

    /// Settings given explicitly on the command line
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            workers: self.workers,
            max_size: self.max.clone(),
            wait: self.wait,
            drain: self.drain,
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool, debug: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            return tracing_subscriber::EnvFilter::new("debug");
        }
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
