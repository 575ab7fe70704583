//! SQLite connection management
//!
//! A single `Arc<Mutex<Connection>>` shared by all relational resolvers.
//! Callers run queries on the blocking thread pool through
//! [`SqlitePool::run`], so the lock is never held across an `.await`.

use cov2k_config::SqliteConfig;
use parking_lot::Mutex;
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::schema;

#[derive(Clone)]
pub struct SqlitePool {
    conn: Arc<Mutex<Connection>>,
    config: SqliteConfig,
}

impl SqlitePool {
    pub fn new(config: SqliteConfig) -> StoreResult<Self> {
        info!(path = ?config.path, "Opening sequence database");

        let conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Connection(format!("Failed to create directory: {}", e))
                })?;
            }
            Connection::open(&config.path)?
        };

        let pool = Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        };
        pool.initialize()?;
        Ok(pool)
    }

    /// Transient database for tests and demos.
    pub fn memory() -> StoreResult<Self> {
        Self::new(SqliteConfig {
            path: ":memory:".into(),
            wal_mode: false,
            ..SqliteConfig::default()
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run `f` against the connection on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || pool.with_connection(f)).await?
    }

    fn initialize(&self) -> StoreResult<()> {
        self.with_connection(|conn| {
            self.configure_pragmas(conn)?;
            schema::apply_migrations(conn)?;
            info!("Sequence database initialized");
            Ok(())
        })
    }

    fn configure_pragmas(&self, conn: &Connection) -> StoreResult<()> {
        debug!("Configuring SQLite pragmas");

        if self.config.wal_mode && !self.config.is_memory() {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        }
        if self.config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }
        conn.execute_batch(&format!(
            "PRAGMA busy_timeout = {};",
            self.config.busy_timeout_ms
        ))?;
        conn.execute_batch(&format!("PRAGMA cache_size = {};", self.config.cache_size))?;
        if self.config.mmap_size > 0 && !self.config.is_memory() {
            conn.execute_batch(&format!("PRAGMA mmap_size = {};", self.config.mmap_size))?;
        }
        conn.execute_batch("PRAGMA temp_store = MEMORY;")?;
        Ok(())
    }

    /// Run a batch of SQL statements in one transaction, e.g. a data dump.
    /// Nothing is kept when any statement fails.
    pub fn execute_script(&self, sql: &str) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.commit()?;
        Ok(())
    }

    /// Size and per-table row counts, reported by the readiness endpoint.
    pub async fn stats(&self) -> StoreResult<DbStats> {
        self.run(table_stats).await
    }
}

fn table_stats(conn: &Connection) -> StoreResult<DbStats> {
    let page_count: i64 = conn.query_row("PRAGMA page_count;", [], |row| row.get(0))?;
    let page_size: i64 = conn.query_row("PRAGMA page_size;", [], |row| row.get(0))?;

    let tables = schema::TABLES
        .into_iter()
        .map(|table| {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(TableCount {
                table,
                rows: count.max(0) as u64,
            })
        })
        .collect::<StoreResult<Vec<_>>>()?;

    Ok(DbStats {
        page_count: page_count.max(0) as u64,
        page_size: page_size.max(0) as u64,
        total_size_bytes: (page_count * page_size).max(0) as u64,
        tables,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub page_count: u64,
    pub page_size: u64,
    pub total_size_bytes: u64,
    pub tables: Vec<TableCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableCount {
    pub table: &'static str,
    pub rows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_pool() {
        let pool = SqlitePool::memory().expect("Failed to create memory pool");
        pool.with_connection(|conn| {
            let result: i64 = conn.query_row("SELECT 1 + 1", [], |row| row.get(0))?;
            assert_eq!(result, 2);
            Ok(())
        })
        .expect("Query failed");
    }

    #[test]
    fn test_file_pool_uses_wal() {
        let dir = TempDir::new().unwrap();
        let config = SqliteConfig {
            path: dir.path().join("nested").join("sequences.db"),
            ..SqliteConfig::default()
        };
        let pool = SqlitePool::new(config).expect("Failed to create pool");
        pool.with_connection(|conn| {
            let mode: String = conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))?;
            assert_eq!(mode.to_lowercase(), "wal");
            Ok(())
        })
        .expect("Query failed");
    }

    #[tokio::test]
    async fn test_stats_list_every_table() {
        let pool = SqlitePool::memory().unwrap();
        let stats = pool.stats().await.unwrap();
        assert!(stats.page_size > 0);
        assert_eq!(stats.tables.len(), schema::TABLES.len());
        assert!(stats.tables.iter().all(|t| t.rows == 0));
    }

    #[tokio::test]
    async fn test_failed_script_keeps_nothing() {
        let pool = SqlitePool::memory().unwrap();
        pool.execute_script("INSERT INTO host_sample (host_sample_id) VALUES (1);")
            .unwrap();

        let err = pool.execute_script(
            "INSERT INTO host_sample (host_sample_id) VALUES (2);
             INSERT INTO no_such_table VALUES (3);",
        );
        assert!(matches!(err, Err(StoreError::Rusqlite(_))));

        let stats = pool.stats().await.unwrap();
        let hosts = stats.tables.iter().find(|t| t.table == "host_sample").unwrap();
        assert_eq!(hosts.rows, 1);
    }

    #[tokio::test]
    async fn test_run_on_blocking_pool() {
        let pool = SqlitePool::memory().unwrap();
        let count = pool
            .run(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM sequence", [], |r| r.get::<_, i64>(0))?))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
