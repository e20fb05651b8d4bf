//! Report aggregation and rendering

use anyhow::Result;
use crossbeam::channel::Receiver;
use serde_json::json;
use std::collections::BTreeMap;
use std::io::Write;

use super::types::{Report, ScanStats};

/// Reports grouped by category, insertion order kept within a category
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportBook {
    categories: BTreeMap<String, Vec<Report>>,
}

impl ReportBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, report: Report) {
        self.categories
            .entry(report.category.clone())
            .or_default()
            .push(report);
    }

    /// Drain the report channel until every sender is gone
    pub fn collect(report_rx: Receiver<Report>) -> Self {
        let mut book = Self::new();
        for report in report_rx {
            book.add(report);
        }
        tracing::debug!("Collected {} reports in {} categories", book.len(), book.categories.len());
        book
    }

    /// Categories in print order with their reports
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[Report])> {
        self.categories
            .iter()
            .map(|(category, reports)| (category.as_str(), reports.as_slice()))
    }

    /// All reports, grouped by category
    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        self.categories.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Pipe-delimited lines followed by the summary counters
    pub fn write_text(&self, stats: &ScanStats, out: &mut impl Write) -> Result<()> {
        for report in self.reports() {
            writeln!(out, "{}", report)?;
        }
        writeln!(out, "Dirs: {}", stats.directories)?;
        writeln!(out, "Files: {}", stats.files)?;
        writeln!(out, "Elapsed: {:?}", stats.elapsed)?;
        Ok(())
    }

    /// A single JSON document with reports grouped by category
    pub fn write_json(&self, stats: &ScanStats, out: &mut impl Write) -> Result<()> {
        let mut grouped = serde_json::Map::new();
        for (category, reports) in self.categories() {
            let entries: Vec<_> = reports
                .iter()
                .map(|r| json!({
                    "reason": r.reason,
                    "pattern": r.pattern,
                    "path": r.display_path(),
                }))
                .collect();
            grouped.insert(category.to_string(), serde_json::Value::Array(entries));
        }

        let document = json!({
            "reports": grouped,
            "statistics": {
                "directories": stats.directories,
                "files": stats.files,
                "matches": self.len(),
                "elapsed_ms": u64::try_from(stats.elapsed.as_millis()).unwrap_or(u64::MAX),
            }
        });

        writeln!(out, "{}", serde_json::to_string_pretty(&document)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::types::MatchReason;
    use crossbeam::channel::unbounded;
    use std::path::Path;
    use std::time::Duration;

    fn report(name: &str, reason: MatchReason, category: &str) -> Report {
        Report::for_path(&Path::new("root").join(name), reason, category, "p")
    }

    fn stats() -> ScanStats {
        ScanStats {
            directories: 1,
            files: 2,
            elapsed: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_collect_groups_by_category() {
        let (tx, rx) = unbounded();
        tx.send(report("a", MatchReason::Filename, "b-cat")).unwrap();
        tx.send(report("b", MatchReason::Content, "a-cat")).unwrap();
        tx.send(report("a", MatchReason::Content, "b-cat")).unwrap();
        drop(tx);

        let book = ReportBook::collect(rx);
        assert_eq!(book.len(), 3);

        let grouped: Vec<_> = book
            .categories()
            .map(|(category, reports)| (category, reports.len()))
            .collect();
        assert_eq!(grouped, vec![("a-cat", 1), ("b-cat", 2)]);

        // No deduplication, insertion order within a category
        let b_cat: Vec<_> = book.reports().skip(1).map(|r| r.reason).collect();
        assert_eq!(b_cat, vec![MatchReason::Filename, MatchReason::Content]);
    }

    #[test]
    fn test_text_output() {
        let mut book = ReportBook::new();
        book.add(report("a.txt", MatchReason::Filename, "keys"));

        let mut out = Vec::new();
        book.write_text(&stats(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert!(lines[0].starts_with("filename|keys|p|root"));
        assert!(lines[0].ends_with("a.txt"));
        assert_eq!(lines[1], "Dirs: 1");
        assert_eq!(lines[2], "Files: 2");
        assert!(lines[3].starts_with("Elapsed: "));
    }

    #[test]
    fn test_json_output() {
        let mut book = ReportBook::new();
        book.add(report("c.txt", MatchReason::Content, "tokens"));

        let mut out = Vec::new();
        book.write_json(&stats(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["reports"]["tokens"][0]["reason"], "content");
        assert_eq!(value["statistics"]["files"], 2);
        assert_eq!(value["statistics"]["matches"], 1);
    }

    #[test]
    fn test_json_elapsed_saturates() {
        let stats = ScanStats {
            elapsed: Duration::MAX,
            ..stats()
        };

        let mut out = Vec::new();
        ReportBook::new().write_json(&stats, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["statistics"]["elapsed_ms"], u64::MAX);
    }
}
