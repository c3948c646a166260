use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;
use stepwise_common::{Error, Result};
use tracing::info;

use crate::script::ScriptMigration;

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Writes new, empty script migrations into the migrations directory.
pub struct Scaffold {
    dir: PathBuf,
}

impl Scaffold {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<timestamp>-<label>.yml`, or `<timestamp>.yml` without a usable label.
    pub fn file_name(label: Option<&str>, now: DateTime<Utc>) -> Result<String> {
        let stamp = now.format(TIMESTAMP_FORMAT).to_string();
        Ok(match sanitize_label(label)? {
            Some(label) => format!("{stamp}-{label}.yml"),
            None => format!("{stamp}.yml"),
        })
    }

    /// Create the scaffold file. Never overwrites an existing one.
    pub fn create(&self, label: Option<&str>, now: DateTime<Utc>) -> Result<PathBuf> {
        let name = match sanitize_label(label)? {
            Some(label) => label,
            None => now.format(TIMESTAMP_FORMAT).to_string(),
        };
        let path = self.dir.join(Self::file_name(label, now)?);

        let definition = ScriptMigration {
            name,
            up: Some(String::new()),
            down: Some(String::new()),
            shell: None,
        };
        let body = serde_yaml::to_string(&definition)
            .map_err(|e| Error::Other(format!("failed to render migration: {e}")))?;
        let contents = format!(
            "# Created by `stepwise new` at {}.\n\
             # `up` applies the change and `down` reverts it; both run via `sh -c`.\n\
             # An empty command does nothing.\n{body}",
            now.to_rfc3339()
        );

        std::fs::create_dir_all(&self.dir)?;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| Error::Other(format!("failed to create {}: {e}", path.display())))?;
        file.write_all(contents.as_bytes())?;

        info!("new migration created @{}", path.display());
        Ok(path)
    }
}

fn sanitize_label(label: Option<&str>) -> Result<Option<String>> {
    let Some(label) = label else {
        return Ok(None);
    };
    let unsafe_chars = Regex::new(r"[^A-Za-z0-9_-]+")
        .map_err(|e| Error::Other(format!("invalid label pattern: {e}")))?;
    let cleaned = unsafe_chars.replace_all(label.trim(), "_");
    let cleaned = cleaned.trim_matches('_');
    Ok((!cleaned.is_empty()).then(|| cleaned.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap()
    }

    #[test]
    fn file_name_uses_utc_timestamp_and_label() {
        assert_eq!(
            Scaffold::file_name(Some("add users"), fixed_time()).unwrap(),
            "20240301-090507-add_users.yml"
        );
        assert_eq!(
            Scaffold::file_name(None, fixed_time()).unwrap(),
            "20240301-090507.yml"
        );
        assert_eq!(
            Scaffold::file_name(Some("../.."), fixed_time()).unwrap(),
            "20240301-090507.yml"
        );
    }

    #[test]
    fn created_file_is_a_loadable_noop_migration() {
        let dir = tempfile::tempdir().unwrap();
        let scaffold = Scaffold::new(dir.path().join("res").join("migrate"));

        let path = scaffold.create(Some("seed-data"), fixed_time()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "20240301-090507-seed-data.yml"
        );

        let unit = crate::script::load_file(&path).unwrap();
        assert_eq!(unit.name(), "seed-data");
        assert!(unit.has_up());
        assert!(unit.has_down());
    }

    #[test]
    fn unlabelled_scaffold_is_named_after_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = Scaffold::new(dir.path()).create(None, fixed_time()).unwrap();

        let unit = crate::script::load_file(&path).unwrap();
        assert_eq!(unit.name(), "20240301-090507");
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let scaffold = Scaffold::new(dir.path());
        scaffold.create(Some("once"), fixed_time()).unwrap();

        let err = scaffold.create(Some("once"), fixed_time()).unwrap_err();
        assert!(err.to_string().contains("failed to create"));
    }
}
