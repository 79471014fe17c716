//! Bundler configuration
//!
//! Loaded from an optional `picopack.toml` next to where the tool runs; CLI
//! flags override file values. The core pipeline itself needs nothing
//! beyond the entry path — everything here belongs to the outer surface.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "picopack.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Path the emitted bundle is written to
    pub output: PathBuf,
    /// Share one identity per resolved file. Set to `false` to reproduce
    /// the reference behavior of re-extracting a file for every import,
    /// together with the reference loader shape.
    pub dedupe: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from("bundle.js"),
            dedupe: true,
        }
    }
}

impl Config {
    /// Load configuration from `dir/picopack.toml`, falling back to
    /// defaults when the file does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            debug!("no {CONFIG_FILE_NAME} found, using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.output, PathBuf::from("bundle.js"));
        assert!(config.dedupe);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "output = \"out/app.js\"\ndedupe = false\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.output, PathBuf::from("out/app.js"));
        assert!(!config.dedupe);
    }

    #[test]
    fn partial_files_keep_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "dedupe = false\n").unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.output, PathBuf::from("bundle.js"));
        assert!(!config.dedupe);
    }

    #[test]
    fn malformed_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "output = [1, 2]\n").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }
}
