use anyhow::Result;
use cov2k_config::AppConfig;
use cov2k_core::{PageWindow, DEFAULT_PAGE};
use cov2k_web::AppState;
use tracing::info;

pub async fn execute(
    config: AppConfig,
    path: String,
    query: Vec<(String, String)>,
    limit: Option<u64>,
    page: Option<u64>,
) -> Result<()> {
    let window = PageWindow::new(
        limit.unwrap_or(config.chain.default_limit),
        page.unwrap_or(DEFAULT_PAGE),
    )?;
    let state = AppState::load(config).await?;

    let records = state.driver.combine(&path, &query, Some(window)).await?;
    info!(path = %path, results = records.len(), "Chain resolved");

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
