//! Run-directory derivation and preparation.
//!
//! Every resolved run gets a unique, human-readable output directory:
//!
//! - single run: `<root>/<dataset.type>/<save_dir>/<model.type>_<summary>/<timestamp>`
//! - sweep run:  `<root>/<sweep_timestamp>/<model.type>_<summary>/<timestamp>`
//!
//! The override summary is the ordered CLI overrides minus an exclusion set,
//! so directories stay distinguishable across sweep members while selector
//! and bookkeeping keys do not bloat the path. Timestamps have second
//! granularity; two runs started within the same second with identical
//! summaries collide, and preparation fails fast rather than overwriting.

use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::error::{ConfigError, Result};
use crate::overrides::OverrideSet;

/// Override keys excluded from the directory-naming summary.
///
/// The exclusion applies only to the summary; the resolved configuration
/// still carries these keys' overridden values.
pub const SUMMARY_EXCLUDED_KEYS: &[&str] = &["dataset", "save_dir", "model.type", "model"];

/// Timestamp fragment used in run paths, second granularity.
pub fn timestamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Render the override summary for one resolved run.
///
/// Overrides appear in CLI order as comma-joined `key=value` fragments;
/// sweep keys take the member's concrete value from `combo`. Path separators
/// in keys or values are rewritten to `.` so the summary stays a single path
/// segment (`train/optim=sgd` renders as `train.optim=sgd`).
pub fn override_summary(overrides: &OverrideSet, combo: &[(String, String)]) -> String {
    let mut fragments = Vec::new();
    for ov in overrides {
        if SUMMARY_EXCLUDED_KEYS.contains(&ov.key.as_str()) {
            continue;
        }
        let value = if ov.is_sweep() {
            match combo.iter().find(|(key, _)| *key == ov.key) {
                Some((_, value)) => value.as_str(),
                None => ov.value(),
            }
        } else {
            ov.value()
        };
        fragments.push(format!("{}={}", ov.key, value).replace('/', "."));
    }
    fragments.join(",")
}

/// Directory for a single (non-sweep) run.
pub fn single_run_dir(
    root: &Path,
    config: &RunConfig,
    summary: &str,
    at: DateTime<Local>,
) -> PathBuf {
    root.join(&config.dataset.r#type)
        .join(&config.save_dir)
        .join(format!("{}_{}", config.model.r#type, summary))
        .join(timestamp(at))
}

/// Directory for one member of a sweep, under the shared sweep root.
pub fn sweep_run_dir(
    root: &Path,
    sweep_at: DateTime<Local>,
    config: &RunConfig,
    summary: &str,
    at: DateTime<Local>,
) -> PathBuf {
    root.join(timestamp(sweep_at))
        .join(format!("{}_{}", config.model.r#type, summary))
        .join(timestamp(at))
}

/// A fully resolved run: its configuration and output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRun {
    pub config: RunConfig,
    /// Override summary fragment used in the directory name.
    pub summary: String,
    pub run_dir: PathBuf,
}

impl ResolvedRun {
    /// Create the run directory and persist the resolved configuration.
    ///
    /// Writes `config.toml` (the full resolved configuration, for
    /// reproducibility) and seeds `train.log` with a header line. Fails with
    /// [`ConfigError::DirectoryCollision`] if the directory already exists;
    /// nothing is ever overwritten.
    pub fn prepare(&self) -> Result<PathBuf> {
        if self.run_dir.exists() {
            return Err(ConfigError::DirectoryCollision {
                path: self.run_dir.clone(),
            }
            .into());
        }
        std::fs::create_dir_all(&self.run_dir)?;

        let config_toml = toml::to_string_pretty(&self.config)?;
        std::fs::write(self.run_dir.join("config.toml"), config_toml)?;

        let mut log = std::fs::File::create(self.run_dir.join("train.log"))?;
        writeln!(log, "#seqgen run log")?;

        tracing::info!(run_dir = %self.run_dir.display(), "prepared run directory");
        Ok(self.run_dir.clone())
    }
}
