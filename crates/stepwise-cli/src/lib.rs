pub mod cli;
pub mod command;
pub mod logging;
pub mod render;
pub mod scaffold;
pub mod script;

pub use cli::Cli;
pub use command::{Command, Outcome, build_engine, execute};
pub use scaffold::Scaffold;
