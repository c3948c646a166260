use std::path::PathBuf;

use chrono::Utc;
use stepwise_common::Result;
use stepwise_config::MigrateConfig;
use stepwise_core::{DownReport, ListReport, MigrationEngine, UpReport};
use stepwise_store::register_builtin_backends;

use crate::scaffold::Scaffold;
use crate::script;

/// A command accepted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Up,
    Down,
    List,
    New(Option<String>),
}

impl Command {
    /// Parse a command name case-insensitively. Returns `None` for unknown names.
    pub fn parse(name: &str, label: Option<String>) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "up" => Some(Command::Up),
            "down" => Some(Command::Down),
            "ls" => Some(Command::List),
            "new" => Some(Command::New(label)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Up => "up",
            Command::Down => "down",
            Command::List => "ls",
            Command::New(_) => "new",
        }
    }
}

/// What a successful command produced.
#[derive(Debug)]
pub enum Outcome {
    Up(UpReport),
    Down(DownReport),
    List(ListReport),
    Created(PathBuf),
}

/// Build an engine from config: builtin backends plus every script
/// migration in the migrations directory, registered in file-name order.
pub fn build_engine(config: &MigrateConfig) -> Result<MigrationEngine> {
    let mut engine = MigrationEngine::new(config.storage.clone());
    register_builtin_backends(&mut engine, config);

    for unit in script::load_dir(&config.migrations_dir)? {
        engine.use_migration(unit)?;
    }
    Ok(engine)
}

/// Run one command against the engine.
pub async fn execute(
    engine: &MigrationEngine,
    command: Command,
    scaffold: &Scaffold,
) -> Result<Outcome> {
    match command {
        Command::Up => Ok(Outcome::Up(engine.up().await?)),
        Command::Down => Ok(Outcome::Down(engine.down().await?)),
        Command::List => Ok(Outcome::List(engine.list().await?)),
        Command::New(label) => {
            engine.check()?;
            let path = scaffold.create(label.as_deref(), Utc::now())?;
            Ok(Outcome::Created(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_common::Error;

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!(Command::parse("UP", None), Some(Command::Up));
        assert_eq!(Command::parse("Down", None), Some(Command::Down));
        assert_eq!(Command::parse("lS", None), Some(Command::List));
        assert_eq!(
            Command::parse("New", Some("seed".into())),
            Some(Command::New(Some("seed".into())))
        );
        assert_eq!(Command::parse("status", None), None);
        assert_eq!(Command::parse("list", None), None);
    }

    #[test]
    fn command_names_round_trip() {
        for command in [
            Command::Up,
            Command::Down,
            Command::List,
            Command::New(None),
        ] {
            assert_eq!(Command::parse(command.name(), None), Some(command));
        }
    }

    #[tokio::test]
    async fn new_requires_a_configured_storage() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = MigrateConfig::default();
        config.migrations_dir = dir.path().join("migrate");

        let engine = build_engine(&config).unwrap();
        let scaffold = Scaffold::new(&config.migrations_dir);
        let err = execute(&engine, Command::New(Some("x".into())), &scaffold)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(!config.migrations_dir.exists());
    }

    #[test]
    fn build_engine_rejects_incomplete_script() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("001-broken.yml"), "name: broken\nup: ''\n").unwrap();

        let config = MigrateConfig {
            storage: Some("file".into()),
            migrations_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        match build_engine(&config) {
            Err(Error::Registration(msg)) => {
                assert_eq!(msg, "down function is required for broken")
            }
            Err(other) => panic!("expected registration error, got {other}"),
            Ok(_) => panic!("expected registration error"),
        }
    }
}
