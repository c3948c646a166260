use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stepwise_common::{Error, Result};
use stepwise_core::MigrationUnit;
use tracing::{debug, info};

const DEFAULT_SHELL: &str = "sh";

/// A migration declared in a YAML file, with shell commands for each
/// direction. An empty command is a no-op; a missing one fails registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptMigration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub up: Option<String>,
    #[serde(default)]
    pub down: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

impl ScriptMigration {
    /// Turn the definition into a unit labelled `label`.
    pub fn into_unit(self, label: impl Into<String>) -> MigrationUnit {
        let shell = self.shell.unwrap_or_else(|| DEFAULT_SHELL.to_string());
        let mut unit = MigrationUnit::new(self.name).label(label);

        if let Some(command) = self.up {
            let shell = shell.clone();
            unit = unit.up(move || {
                let shell = shell.clone();
                let command = command.clone();
                async move { run_command(&shell, &command).await }
            });
        }
        if let Some(command) = self.down {
            unit = unit.down(move || {
                let shell = shell.clone();
                let command = command.clone();
                async move { run_command(&shell, &command).await }
            });
        }
        unit
    }
}

/// Script files in `dir`, sorted by file name. A missing directory has none.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!("migrations directory {} not found", dir.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        if is_yaml && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Parse one script file into a unit labelled with its file name.
pub fn load_file(path: &Path) -> Result<MigrationUnit> {
    let contents = std::fs::read_to_string(path)?;
    let definition: ScriptMigration = serde_yaml::from_str(&contents)
        .map_err(|e| Error::Config(format!("invalid migration {}: {e}", path.display())))?;

    let label = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(definition.into_unit(label))
}

/// Load every script migration in `dir`, in execution order.
pub fn load_dir(dir: &Path) -> Result<Vec<MigrationUnit>> {
    let units = discover(dir)?
        .iter()
        .map(|path| load_file(path))
        .collect::<Result<Vec<_>>>()?;
    info!(
        "found {} script migration(s) in {}",
        units.len(),
        dir.display()
    );
    Ok(units)
}

async fn run_command(shell: &str, command: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Ok(());
    }

    debug!("running `{command}` via {shell}");
    let output = tokio::process::Command::new(shell)
        .arg("-c")
        .arg(command)
        .output()
        .await
        .map_err(|e| Error::Other(format!("failed to spawn {shell}: {e}")))?;

    if output.status.success() {
        return Ok(());
    }

    let code = output
        .status
        .code()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(Error::Other(format!(
        "`{command}` exited with {code}: {}",
        stderr.trim()
    )))
}
