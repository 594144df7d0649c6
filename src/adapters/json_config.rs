//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] by reading and validating the bench
//! configuration file from disk on every `load`.

use std::path::PathBuf;

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::{ConfigError, ConfigFile};

pub struct JsonConfigAdapter {
    path: PathBuf,
}

impl JsonConfigAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for JsonConfigAdapter {
    fn load(&self) -> Result<ConfigFile, ConfigError> {
        let text = std::fs::read_to_string(&self.path)?;
        let file = ConfigFile::from_json(&text)?;
        info!(
            "config: loaded {} ({} benches, default `{}`)",
            self.path.display(),
            file.configs.len(),
            file.app.default_config
        );
        Ok(file)
    }
}
