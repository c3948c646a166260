use std::path::{Path, PathBuf};

use stepwise_common::{Error, Result};
use tracing::{debug, info};

use crate::model::AppConfig;

/// Reads `AppConfig` from a YAML or TOML file.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config file. A missing file yields the defaults, which leave
    /// the storage backend unset.
    pub fn load(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            debug!(
                "config file {} not found, using defaults",
                self.path.display()
            );
            return Ok(AppConfig::default());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let config = parse_config(&self.path, &contents)?;
        info!("config loaded from {}", self.path.display());
        Ok(config)
    }
}

fn parse_config(path: &Path, contents: &str) -> Result<AppConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yml" | "yaml" => serde_yaml::from_str(contents)
            .map_err(|e| Error::Config(format!("YAML parse error: {e}"))),
        "toml" => {
            toml::from_str(contents).map_err(|e| Error::Config(format!("TOML parse error: {e}")))
        }
        other => Err(Error::Config(format!(
            "unsupported config extension: {other}"
        ))),
    }
}
