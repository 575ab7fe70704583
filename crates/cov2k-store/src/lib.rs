//! Storage backends for the CoV2K API
//!
//! Two stores answer entity queries:
//!
//! - **Knowledge base**: variants, effects, evidences and the other curated
//!   entities, loaded from a JSON snapshot and queried in memory
//! - **Sequence store**: sequences, host samples, nucleotide mutations,
//!   amino-acid changes, epitopes and assays in SQLite
//!
//! ## Features
//!
//! - **Identifier translation**: short protein names and polyprotein
//!   coordinates are mapped to the sequence store's naming
//! - **Parameterised SQL**: filter values are always bound, never spliced
//! - **WAL Mode**: concurrent reads with write-ahead logging
//! - **Thread Safety**: Arc<Mutex<Connection>> with queries on the blocking pool
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cov2k_store::{build_catalog, KnowledgeBase, SqlitePool};
//!
//! let kb = Arc::new(KnowledgeBase::load("./data/knowledge_base.json").await?);
//! let pool = SqlitePool::new(config.storage.sqlite.clone())?;
//! let catalog = build_catalog(kb, pool)?;
//! ```

pub mod catalog;
pub mod connection;
pub mod document;
pub mod error;
pub mod relational;
pub mod schema;
pub mod translate;

// Re-exports
pub use catalog::{backend_of, build_catalog, Backend};
pub use connection::{DbStats, SqlitePool};
pub use document::{DocumentResolver, KbStats, KnowledgeBase};
pub use error::{StoreError, StoreResult};
pub use relational::SqlResolver;
