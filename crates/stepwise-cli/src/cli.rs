use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "stepwise")]
#[command(version, about = "Run, revert and list migrations", long_about = None)]
pub struct Cli {
    /// Command to run: up, down, ls or new (case-insensitive)
    pub command: Option<String>,

    /// Label for `new`, used in the generated file name
    pub label: Option<String>,

    /// Config file path (.yml, .yaml or .toml)
    #[arg(short, long, default_value = "stepwise.yml")]
    pub config: PathBuf,

    /// Storage backend key, overriding `migrate.storage`
    #[arg(long, env = "STEPWISE_STORAGE")]
    pub storage: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print `ls` output as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_and_label() {
        let cli = Cli::try_parse_from(["stepwise", "NEW", "add_users", "--storage", "file"]).unwrap();
        assert_eq!(cli.command.as_deref(), Some("NEW"));
        assert_eq!(cli.label.as_deref(), Some("add_users"));
        assert_eq!(cli.storage.as_deref(), Some("file"));
        assert_eq!(cli.config, PathBuf::from("stepwise.yml"));
        assert!(!cli.json);
    }

    #[test]
    fn command_is_optional() {
        let cli = Cli::try_parse_from(["stepwise", "-v", "-c", "db.toml"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("db.toml"));
    }
}
