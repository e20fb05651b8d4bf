use anyhow::{Context, Result, bail};
use figment::providers::Serialized;
use figment::value::{Dict, Map};
use figment::{Error, Metadata, Profile, Provider};
use std::fs;
use std::path::{Path, PathBuf};

use super::SettingsOverrides;
use super::bytes::to_bytes;

/// Figment provider for the `key=value` config file.
///
/// Recognized keys are `threads` and `maxSize`; the first occurrence of a
/// key wins and unknown keys are ignored. Blank lines and `#` comments are
/// skipped.
pub struct KeyValueFile {
    path: PathBuf,
}

impl KeyValueFile {
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read and validate the file
    pub fn load(&self) -> Result<SettingsOverrides> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Error opening config file {}", self.path.display()))?;
        parse(&text).with_context(|| format!("Error parsing config file {}", self.path.display()))
    }
}

impl Provider for KeyValueFile {
    fn metadata(&self) -> Metadata {
        Metadata::named(format!("config file {}", self.path.display()))
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let overrides = self.load().map_err(|e| Error::from(format!("{:#}", e)))?;
        Serialized::defaults(overrides).data()
    }
}

/// Parse config file text into the settings it overrides
pub fn parse(text: &str) -> Result<SettingsOverrides> {
    let mut overrides = SettingsOverrides::default();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('=').collect();
        let [key, value] = parts.as_slice() else {
            bail!("Error parsing config at line {}", line_number);
        };
        let (key, value) = (key.trim(), value.trim());

        match key {
            "threads" if overrides.workers.is_none() => {
                let threads = value
                    .parse::<usize>()
                    .with_context(|| format!("Error parsing threads value at line {}", line_number))?;
                if threads == 0 {
                    bail!("threads must be positive at line {}", line_number);
                }
                overrides.workers = Some(threads);
            }
            "maxSize" if overrides.max_size.is_none() => {
                to_bytes(value).with_context(|| format!("Error parsing maxSize at line {}", line_number))?;
                overrides.max_size = Some(value.to_string());
            }
            _ => {}
        }
    }

    Ok(overrides)
}
