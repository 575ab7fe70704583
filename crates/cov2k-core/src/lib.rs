//! # cov2k-core
//!
//! Query engine of the CoV2K knowledge-base API.
//!
//! ## Features
//!
//! - **Entity catalog**: the closed set of entity names, each bound to one
//!   resolver and one identifier field
//! - **Filter intersection**: AND-combination of independently fetched
//!   candidate lists, anchored to the first registered filter
//! - **Pagination**: optional and mandatory `limit`/`page` normalisation
//! - **Chaining**: backward evaluation of entity paths such as
//!   `/combine/effects/evidences?citation=McCallum`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cov2k_core::{ChainDriver, EntityCatalog, PageWindow};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(EntityCatalog::from_fn(|name| build_resolver(name)));
//! let driver = ChainDriver::new(catalog);
//! let params = vec![("citation".to_string(), "McCallum".to_string())];
//! let effects = driver
//!     .combine("effects/evidences", &params, Some(PageWindow::default()))
//!     .await?;
//! ```

pub mod catalog;
pub mod chain;
pub mod error;
pub mod intersect;
pub mod pagination;
pub mod record;
pub mod resolver;

pub use catalog::{EntityCatalog, EntityName, ENTITY_COUNT};
pub use chain::{is_pagination_key, ChainDriver, ChainLimits, ChainPlan, HopFilter, HopMode};
pub use error::{CoreError, CoreResult};
pub use intersect::{FilterIntersection, Intersection};
pub use pagination::{PageWindow, Pagination, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use record::{Filter, Record, Scalar};
pub use resolver::{EntityResolver, PaginationPolicy, ResolveError, ResolveResult};
