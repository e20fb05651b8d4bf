use anyhow::Result;
use std::io::{self, Write};

use super::{Cli, Output};
use crate::config::ScanSettings;
use crate::scanner::{Pipeline, RuleSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One pipe-delimited line per match, then the summary
    Text,
    /// JSON document grouped by category
    Json,
}

pub fn execute(cli: &Cli, output: &Output) -> Result<()> {
    let settings = ScanSettings::load(cli.config.as_deref(), &cli.overrides())?;
    let config = settings.resolve()?;
    let rules = RuleSet::load(&cli.rules)?;

    output.verbose(&format!(
        "Loaded {} rules from {}",
        rules.rule_count(),
        cli.rules.display()
    ));
    output.key_value("Workers", &config.max_workers.to_string());
    output.key_value("Max size", &format!("{} bytes", config.max_file_size));
    output.key_value("Drain", &config.drain.to_string());

    let pipeline = Pipeline::new(rules, config);
    let outcome = pipeline.run(&cli.path)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        OutputFormat::Text => outcome.reports.write_text(&outcome.stats, &mut out)?,
        OutputFormat::Json => outcome.reports.write_json(&outcome.stats, &mut out)?,
    }
    out.flush()?;

    output.key_value("Jobs", &outcome.jobs_dispatched.to_string());
    if outcome.reports.is_empty() {
        output.success("No matches found");
    }

    Ok(())
}
