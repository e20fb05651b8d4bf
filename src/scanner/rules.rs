//! Classification rules and the line-oriented rule file they are loaded from
//!
//! A rule file looks like this:
//!
//! ```text
//! # comments and blank lines are skipped
//! ;section filename
//! ;category keys
//! \.pem$
//! ;section content
//! ;category tokens
//! token=\d+
//! ```
//!
//! Rules keep file order. Inclusion sections are first-match-wins for
//! filenames and all-matches for content; ignore sections are plain set
//! membership.

use anyhow::{Context, Result, bail};
use regex::bytes::Regex;
use std::fs;
use std::path::Path;

const DEFAULT_CATEGORY: &str = "none";

/// A compiled pattern tagged with the category it files matches under
#[derive(Debug, Clone)]
pub struct Rule {
    pub regex: Regex,
    pub category: String,
}

impl Rule {
    pub fn new(pattern: &str, category: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("Invalid regular expression '{}'", pattern))?;
        Ok(Self {
            regex,
            category: category.to_string(),
        })
    }

    /// Source text of the pattern, as written in the rule file
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.regex.is_match(haystack)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern() && self.category == other.category
    }
}

impl Eq for Rule {}

/// The four rule lists a rule file can populate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSection {
    Filename,
    Content,
    IgnoreFilename,
    IgnoreContent,
}

impl RuleSection {
    /// Resolve a `;section ...` directive. The longer ignore suffixes are
    /// checked first since they also end in `filename` / `content`.
    fn from_directive(line: &str) -> Option<Self> {
        if line.ends_with("ignore-filename") {
            Some(RuleSection::IgnoreFilename)
        } else if line.ends_with("ignore-content") {
            Some(RuleSection::IgnoreContent)
        } else if line.ends_with("content") {
            Some(RuleSection::Content)
        } else if line.ends_with("filename") {
            Some(RuleSection::Filename)
        } else {
            None
        }
    }
}

/// Ordered rule lists, read-only once loaded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub filename: Vec<Rule>,
    pub content: Vec<Rule>,
    pub ignore_filename: Vec<Rule>,
    pub ignore_content: Vec<Rule>,
}

impl RuleSet {
    /// Load rules from a rule file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Unable to open rule file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Error in rule file {}", path.display()))
    }

    /// Parse rule file text
    pub fn parse(text: &str) -> Result<Self> {
        let mut rules = RuleSet::default();
        let mut section: Option<RuleSection> = None;
        let mut category = DEFAULT_CATEGORY.to_string();

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with(";section") {
                let Some(next) = RuleSection::from_directive(line) else {
                    bail!("Unknown section directive at line {}: {}", line_number, line);
                };
                section = Some(next);
                category = DEFAULT_CATEGORY.to_string();
            } else if line.starts_with(";category") {
                match line.split_once(' ') {
                    Some((_, label)) if !label.is_empty() => category = label.to_string(),
                    _ => bail!("Category directive without a label at line {}", line_number),
                }
            } else {
                let Some(section) = section else {
                    bail!("Rule at line {} appears before any section directive", line_number);
                };
                let rule = Rule::new(line, &category)
                    .with_context(|| format!("Bad rule at line {}", line_number))?;
                rules.section_mut(section).push(rule);
            }
        }

        Ok(rules)
    }

    fn section_mut(&mut self, section: RuleSection) -> &mut Vec<Rule> {
        match section {
            RuleSection::Filename => &mut self.filename,
            RuleSection::Content => &mut self.content,
            RuleSection::IgnoreFilename => &mut self.ignore_filename,
            RuleSection::IgnoreContent => &mut self.ignore_content,
        }
    }

    /// First filename rule matching `name`
    pub fn classify_filename(&self, name: &str) -> Option<&Rule> {
        self.filename.iter().find(|rule| rule.is_match(name.as_bytes()))
    }

    /// Every content rule matching `content`, in rule order
    pub fn classify_content(&self, content: &[u8]) -> Vec<&Rule> {
        self.content.iter().filter(|rule| rule.is_match(content)).collect()
    }

    /// Whether the file should be skipped entirely
    pub fn is_filename_ignored(&self, name: &str) -> bool {
        self.ignore_filename.iter().any(|rule| rule.is_match(name.as_bytes()))
    }

    /// Whether the file's content should not be scanned
    pub fn is_content_ignored(&self, name: &str) -> bool {
        self.ignore_content.iter().any(|rule| rule.is_match(name.as_bytes()))
    }

    pub fn rule_count(&self) -> usize {
        self.filename.len() + self.content.len() + self.ignore_filename.len() + self.ignore_content.len()
    }
}
