use anyhow::Result;
use cov2k_config::AppConfig;
use cov2k_web::{start_server, AppState};
use tracing::info;

pub async fn execute(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let state = AppState::load(config).await?;
    info!(
        bind = %state.config.server.bind_address(),
        max_filter_params = state.config.server.max_filter_params,
        "Catalog ready"
    );
    start_server(state).await?;
    Ok(())
}
