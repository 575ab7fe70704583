//! # cov2k-config
//!
//! Configuration for the CoV2K API server and CLI.
//!
//! Every section is optional in the TOML file; missing keys take their
//! defaults. Selected values can be overridden from the environment
//! (`COV2K_HOST`, `COV2K_PORT`, `COV2K_KB_PATH`, `COV2K_DB_PATH`,
//! `COV2K_LOG_LEVEL`).
//!
//! ```rust,no_run
//! use cov2k_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load_from_file("cov2k.toml").await?;
//!     println!("listening on {}", config.server.bind_address());
//!     Ok(())
//! }
//! ```

mod config;
mod loader;

pub use config::*;
pub use loader::*;
