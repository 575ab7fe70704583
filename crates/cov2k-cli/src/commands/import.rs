use std::path::PathBuf;

use anyhow::{Context, Result};
use cov2k_config::AppConfig;
use cov2k_store::SqlitePool;
use tracing::info;

pub async fn execute(config: AppConfig, file: PathBuf) -> Result<()> {
    let sql = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let pool = SqlitePool::new(config.storage.sqlite.clone())?;
    let importer = pool.clone();
    tokio::task::spawn_blocking(move || importer.execute_script(&sql)).await??;
    let stats = pool.stats().await?;

    info!(
        file = %file.display(),
        database = %config.storage.sqlite.path.display(),
        "Import finished"
    );
    for table in &stats.tables {
        println!("{:<20} {}", table.table, table.rows);
    }
    Ok(())
}
