use anyhow::Result;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Build the log filter: an explicit CLI level, else `RUST_LOG`, else the
/// config file's `logging.level`.
pub fn env_filter(cli_level: Option<LevelFilter>, config_level: &str) -> Result<EnvFilter> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config_level))?,
    };
    Ok(filter)
}

pub fn init_logging(cli_level: Option<LevelFilter>, config_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(cli_level, config_level)?)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
