use anyhow::Result;
use clap::Parser;
use cov2k_config::ConfigLoader;
use tracing::debug;

use cov2k_cli::cli::{Cli, Commands};
use cov2k_cli::{commands, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(&cli.config).await?;
    logging::init_logging(cli.level_override(), &config.logging.level)?;
    debug!(config = %cli.config.display(), "Configuration loaded");

    match cli.command {
        Commands::Serve { host, port } => commands::serve::execute(config, host, port).await,
        Commands::Combine { path, query, limit, page } => {
            commands::combine::execute(config, path, query, limit, page).await
        }
        Commands::Entities { json } => commands::entities::execute(json),
        Commands::Import { file } => commands::import::execute(config, file).await,
    }
}
