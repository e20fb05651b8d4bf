//! Configuration management for filesift
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults ([`ScanSettings::default`])
//! 2. The optional `key=value` config file ([`KeyValueFile`])
//! 3. `FILESIFT_*` environment variables
//! 4. Flags given on the command line
//!
//! The merged [`ScanSettings`] are then resolved into an immutable
//! [`ScanConfig`] that every worker reads.

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::parallel::DrainPolicy;

pub mod bytes;
pub mod file;

pub use bytes::to_bytes;
pub use file::KeyValueFile;

#[cfg(test)]
mod tests;

/// Prefix for environment overrides, e.g. `FILESIFT_WORKERS=4`
pub const ENV_PREFIX: &str = "FILESIFT_";

/// How the end of a scan is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DrainMode {
    /// Count jobs in flight and stop when none remain
    Tracked,
    /// Stop once the queue has been empty for the wait delay
    Timeout,
}

/// User-facing settings before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Worker threads (0 = one per CPU core)
    pub workers: usize,
    /// Largest file whose content is scanned, as a byte quantity
    pub max_size: String,
    /// Drain timeout in seconds, used by [`DrainMode::Timeout`]
    pub wait: u64,
    pub drain: DrainMode,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            workers: 8,
            max_size: "10MB".to_string(),
            wait: 5,
            drain: DrainMode::Tracked,
        }
    }
}

/// A partial set of settings; only the fields that are set take effect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drain: Option<DrainMode>,
}

/// Resolved configuration, immutable for the lifetime of a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub max_workers: usize,
    pub max_file_size: u64,
    pub drain: DrainPolicy,
}

impl ScanSettings {
    /// Merge every configuration layer
    pub fn load(config_file: Option<&Path>, overrides: &SettingsOverrides) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(ScanSettings::default()));

        if let Some(path) = config_file {
            figment = figment.merge(KeyValueFile::file(path));
        }

        figment = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides));

        figment.extract().context("Invalid scan configuration")
    }

    /// Validate and convert into the configuration the pipeline runs with
    pub fn resolve(&self) -> Result<ScanConfig> {
        let max_workers = if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        };

        let max_file_size = to_bytes(&self.max_size).context("Error parsing max size")?;

        let drain = match self.drain {
            DrainMode::Tracked => DrainPolicy::Tracked,
            DrainMode::Timeout => {
                if self.wait == 0 {
                    bail!("Wait delay must be at least one second with the timeout drain");
                }
                DrainPolicy::Timeout { seconds: self.wait }
            }
        };

        Ok(ScanConfig {
            max_workers,
            max_file_size,
            drain,
        })
    }
}
