//! Shared application state

use std::sync::Arc;

use cov2k_config::AppConfig;
use cov2k_core::{ChainDriver, ChainLimits, EntityCatalog};
use cov2k_store::{build_catalog, KnowledgeBase, SqlitePool};
use tracing::info;

use crate::Result;

#[derive(Clone)]
pub struct AppState {
    pub driver: ChainDriver,
    pub kb: Arc<KnowledgeBase>,
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, kb: KnowledgeBase, pool: SqlitePool) -> Result<Self> {
        let kb = Arc::new(kb);
        let catalog = build_catalog(kb.clone(), pool.clone())?;
        let limits = ChainLimits {
            max_intermediate_values: config.chain.max_intermediate_values,
            fan_out_concurrency: config.chain.fan_out_concurrency,
        };
        Ok(Self {
            driver: ChainDriver::with_limits(Arc::new(catalog), limits),
            kb,
            pool,
            config: Arc::new(config),
        })
    }

    /// Open both stores named by `config`.
    pub async fn load(config: AppConfig) -> Result<Self> {
        let kb = KnowledgeBase::load(&config.storage.knowledge_base).await?;
        let pool = SqlitePool::new(config.storage.sqlite.clone())?;
        info!(
            knowledge_base = %config.storage.knowledge_base.display(),
            sequences = %config.storage.sqlite.path.display(),
            "Stores opened"
        );
        Self::new(config, kb, pool)
    }

    pub fn catalog(&self) -> &EntityCatalog {
        self.driver.catalog()
    }
}
