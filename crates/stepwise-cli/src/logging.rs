use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` takes precedence, then
/// `--verbose`, then the configured level.
pub fn init_tracing(verbose: bool, configured_level: Option<&str>) {
    let default_level = if verbose {
        "debug"
    } else {
        configured_level.unwrap_or("info")
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
